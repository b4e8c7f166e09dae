use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::actor::dispatcher::Bindings;
use crate::actor::reactor::{self, Event as ReactorEvent};
use crate::common::config::{Config, ConfigError};
use crate::model::Snapshot;

/// One generation of configuration: a config and the binding tables built
/// from it. The two are never swapped separately.
#[derive(Debug)]
pub struct LiveState {
    pub config: Arc<Config>,
    pub bindings: Arc<Bindings>,
}

impl LiveState {
    fn build(mut config: Config) -> Result<Self, ConfigError> {
        prepare(&mut config);
        let bindings = Bindings::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            bindings: Arc::new(bindings),
        })
    }
}

/// The active configuration generation, plus at most one staged generation
/// waiting for the reactor.
///
/// The watcher thread only builds and stages; the reactor swaps the staged
/// generation in with [`apply_staged`](Self::apply_staged) when it handles
/// the reload, so every event sees a single generation throughout.
pub struct LiveConfig {
    path: Option<PathBuf>,
    current: Snapshot<LiveState>,
    staged: Mutex<Option<Arc<LiveState>>>,
}

impl LiveConfig {
    pub fn new(path: Option<PathBuf>, config: Config) -> Result<Self, ConfigError> {
        Ok(Self {
            path,
            current: Snapshot::from_value(LiveState::build(config)?),
            staged: Mutex::new(None),
        })
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn load(&self) -> Arc<LiveState> { self.current.load() }

    pub fn config(&self) -> Arc<Config> { self.load().config.clone() }

    /// Re-read the config file and stage the result. On error nothing is
    /// staged and the current generation stays active.
    pub fn stage_reload(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            debug!("no config file; nothing to reload");
            return Ok(());
        };
        let config = Config::read_or_default(path)?;
        self.stage(config)
    }

    pub fn stage(&self, config: Config) -> Result<(), ConfigError> {
        let state = LiveState::build(config)?;
        if self.staged.lock().replace(Arc::new(state)).is_some() {
            debug!("replaced a staged config that was never applied");
        }
        Ok(())
    }

    /// Make the staged generation current in one swap.
    pub fn apply_staged(&self) -> Option<Arc<LiveState>> {
        let state = self.staged.lock().take()?;
        self.current.store(state.clone());
        info!("config applied");
        Some(state)
    }
}

fn prepare(config: &mut Config) {
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    let fixes = config.auto_fix_values();
    if fixes > 0 {
        info!("applied {fixes} automatic config fixes");
    }
}

/// Polls the config file and reloads it when it changes.
pub struct ConfigWatcher {
    file: PathBuf,
    live: Arc<LiveConfig>,
    events_tx: reactor::Sender,
}

impl ConfigWatcher {
    pub fn spawn(live: Arc<LiveConfig>, events_tx: reactor::Sender) {
        let Some(file) = live.path().map(Path::to_path_buf) else {
            debug!("no config file to watch");
            return;
        };
        let spawned = thread::Builder::new().name("config-watcher".to_string()).spawn(move || {
            let actor = ConfigWatcher { file, live, events_tx };
            if let Err(e) = actor.run() {
                warn!("config-watcher: error: {e:?}");
            }
        });
        if let Err(e) = spawned {
            warn!("failed to spawn config-watcher thread: {e}");
        }
    }

    fn run(self) -> notify::Result<()> {
        let (tx, rx) = crossbeam_channel::unbounded::<notify::Result<Event>>();

        let mut watcher = PollWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            NotifyConfig::default()
                .with_poll_interval(Duration::from_secs(1))
                .with_compare_contents(true),
        )?;

        watcher.watch(&self.file, RecursiveMode::NonRecursive)?;

        info!("watching {:?}", self.file);

        for res in rx {
            match res {
                Ok(event) if self.is_relevant(&event) => {
                    debug!("change detected: {:?}", event.kind);
                    self.reload();
                }
                Ok(event) => debug!("ignoring unrelated event: {:?}", event.kind),
                Err(e) => warn!("watch error: {e:?}"),
            }
        }
        warn!("channel closed, exiting");
        Ok(())
    }

    fn is_relevant(&self, event: &Event) -> bool {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => event
                .paths
                .iter()
                .any(|p| p == &self.file || p.file_name() == self.file.file_name()),
            _ => false,
        }
    }

    fn reload(&self) {
        match self.live.stage_reload() {
            Ok(_) => self.events_tx.send(ReactorEvent::ConfigReloaded),
            Err(e) => {
                warn!("config reload failed, keeping the old config: {e}");
                self.events_tx.send(ReactorEvent::ConfigFailed(e.to_string()));
            }
        }
    }
}
