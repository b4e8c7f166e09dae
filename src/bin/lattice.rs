use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use lattice_wm::actor;
use lattice_wm::actor::config_watcher::{ConfigWatcher, LiveConfig};
use lattice_wm::actor::dispatcher::Action;
use lattice_wm::actor::reactor::{Event, Reactor};
use lattice_wm::actor::worker::WorkerPool;
use lattice_wm::common::config::{Config, config_file};
use lattice_wm::common::log;
use lattice_wm::model::{ScreenId, ScreenSpec};
use lattice_wm::server;
use lattice_wm::sys::geometry::Rect;
use tokio::io::BufReader;
use tracing::{error, info, warn};

#[derive(Parser)]
struct Cli {
    /// Config file to use instead of the one in the user config directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check that the config parses and its bindings build, then exit.
    #[arg(long)]
    validate: bool,

    /// Do not reload the config when the file changes.
    #[arg(long)]
    no_watch: bool,

    /// Initial screen size, e.g. 1920x1080, for compositors that do not
    /// announce their outputs.
    #[arg(long, value_name = "WxH", value_parser = parse_screen)]
    screen: Option<Rect>,
}

fn parse_screen(s: &str) -> Result<Rect, String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("expected WxH, got `{s}`"))?;
    let width: i32 = w.trim().parse().map_err(|e| format!("bad width `{w}`: {e}"))?;
    let height: i32 = h.trim().parse().map_err(|e| format!("bad height `{h}`: {e}"))?;
    if width <= 0 || height <= 0 {
        return Err(format!("screen size must be positive, got {width}x{height}"));
    }
    Ok(Rect::new(0, 0, width, height))
}

fn main() -> ExitCode {
    let opt: Cli = Parser::parse();

    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: We are single threaded at this point.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    log::init_logging();
    install_panic_hook();

    let path = opt.config.clone().unwrap_or_else(config_file);
    if opt.validate {
        return match validate(&path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e:#}");
                ExitCode::FAILURE
            }
        };
    }

    match run(opt, path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn validate(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    let config = Config::read(path).with_context(|| format!("in {}", path.display()))?;
    for issue in config.validate() {
        warn!("{issue}");
    }
    let live = LiveConfig::new(None, config).with_context(|| format!("in {}", path.display()))?;
    println!("{}: ok ({} bindings)", path.display(), live.load().bindings.len());
    Ok(())
}

fn run(opt: Cli, path: PathBuf) -> anyhow::Result<()> {
    let config = Config::read_or_default(&path)?;
    let live = Arc::new(LiveConfig::new(Some(path), config)?);
    let config = live.config();

    let screens: Vec<ScreenSpec> = opt
        .screen
        .map(|frame| ScreenSpec { id: ScreenId::new(0), frame })
        .into_iter()
        .collect();

    let (events_tx, events_rx) = actor::channel();
    let (requests_tx, requests_rx) = actor::channel();
    let (broadcast_tx, broadcast_rx) = actor::channel();

    let workers = {
        let events_tx = events_tx.clone();
        WorkerPool::new(
            config.settings.worker_threads,
            Some(Arc::new(move || events_tx.send(Event::WorkCompleted))),
        )
    };

    if !opt.no_watch {
        ConfigWatcher::spawn(live.clone(), events_tx.clone());
    }

    let mut reactor = Reactor::new(live, &screens, workers, requests_tx, Some(broadcast_tx));
    reactor.run_startup_commands();

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("could not start the runtime")?;

    let result = rt.block_on(async move {
        let input = {
            let events_tx = events_tx.clone();
            tokio::spawn(async move {
                let stdin = BufReader::new(tokio::io::stdin());
                if let Err(e) = server::read_events(stdin, events_tx.clone()).await {
                    warn!("reading events failed: {e}");
                }
                info!("compositor went away; shutting down");
                events_tx.send(Event::Command { action: Action::Shutdown });
            })
        };
        drop(events_tx);
        let stdout = tokio::io::stdout();
        let output = tokio::spawn(server::write_output(requests_rx, broadcast_rx, stdout));

        reactor.run(events_rx).await;
        input.abort();
        output.await.context("output task panicked")?.context("writing requests failed")
    });

    // Stdin is read on a blocking thread that cannot be interrupted.
    rt.shutdown_background();
    result
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // Abort on panic instead of leaving the other threads running without
    // the reactor.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
