use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{Event, Reactor, Request, RequestReceiver};
use crate::actor::broadcast::{BroadcastEvent, BroadcastReceiver};
use crate::actor::config_watcher::LiveConfig;
use crate::actor::dispatcher::Action;
use crate::actor::worker::WorkerPool;
use crate::actor::{self};
use crate::common::collections::BTreeMap;
use crate::common::config::Config;
use crate::model::{ScreenId, ScreenSpec, WindowId, WindowInfo};
use crate::sys::geometry::Rect;

pub const TEST_CONFIG: &str = r#"
    groups = ["1", "2", "3"]
    layouts = [
        { kind = "columns", border_width = 0 },
        { kind = "max" },
    ]

    [[keys]]
    trigger = "Super + j"
    action = "focus_next"
"#;

/// A reactor wired to channels the test reads from, standing in for the
/// compositor and the bar. Configure requests are applied to `frames` as if
/// the compositor honoured them.
pub struct Harness {
    pub reactor: Reactor,
    requests_rx: RequestReceiver,
    broadcast_rx: BroadcastReceiver,
    pending: Vec<Request>,
    pub frames: BTreeMap<WindowId, Rect>,
    hidden: BTreeMap<WindowId, bool>,
    stack: Option<Vec<WindowId>>,
}

impl Harness {
    pub fn new(config: &str) -> Self {
        let config = Config::parse(config).unwrap();
        Self::from_live(LiveConfig::new(None, config).unwrap())
    }

    pub fn with_path(path: &Path) -> Self {
        let config = Config::read(path).unwrap();
        Self::from_live(LiveConfig::new(Some(path.to_path_buf()), config).unwrap())
    }

    fn from_live(live: LiveConfig) -> Self {
        let (requests_tx, requests_rx) = actor::channel();
        let (broadcast_tx, broadcast_rx) = actor::channel();
        let screen = ScreenSpec {
            id: ScreenId::new(0),
            frame: Rect::new(0, 0, 1200, 800),
        };
        let reactor = Reactor::new(
            Arc::new(live),
            &[screen],
            WorkerPool::new(1, None),
            requests_tx,
            Some(broadcast_tx),
        );
        let mut harness = Harness {
            reactor,
            requests_rx,
            broadcast_rx,
            pending: Vec::new(),
            frames: BTreeMap::new(),
            hidden: BTreeMap::new(),
            stack: None,
        };
        harness.requests();
        harness
    }

    pub fn event(&mut self, event: Event) {
        self.reactor.handle_event(event);
        self.pump();
    }

    pub fn command(&mut self, action: Action) { self.event(Event::Command { action }); }

    pub fn key(&mut self, trigger: &str) {
        self.event(Event::KeyPressed { trigger: trigger.parse().unwrap() });
    }

    pub fn map_window(&mut self, id: u64, class: &str) {
        self.event(Event::WindowMapped {
            id: WindowId::new(id),
            info: WindowInfo {
                class: Some(class.to_string()),
                title: Some(format!("{class} {id}")),
                ..Default::default()
            },
        });
    }

    pub fn map_windows(&mut self, n: u64) {
        for id in 1..=n {
            self.map_window(id, "term");
        }
    }

    fn pump(&mut self) {
        while let Ok((_, request)) = self.requests_rx.try_recv() {
            match &request {
                Request::Configure { window, frame, .. } => {
                    self.frames.insert(*window, *frame);
                    self.hidden.insert(*window, false);
                }
                Request::Hide { window } => {
                    self.hidden.insert(*window, true);
                }
                Request::Restack { windows } => self.stack = Some(windows.clone()),
                _ => {}
            }
            self.pending.push(request);
        }
    }

    /// Requests sent since the last call.
    pub fn requests(&mut self) -> Vec<Request> {
        self.pump();
        std::mem::take(&mut self.pending)
    }

    pub fn broadcasts(&mut self) -> Vec<BroadcastEvent> {
        let mut out = Vec::new();
        while let Ok((_, event)) = self.broadcast_rx.try_recv() {
            out.push(event);
        }
        out
    }

    /// Last frame requested for a window that is currently shown.
    pub fn frame(&mut self, id: u64) -> Option<Rect> {
        self.pump();
        let id = WindowId::new(id);
        if self.hidden(id.get()) {
            return None;
        }
        self.frames.get(&id).copied()
    }

    pub fn hidden(&mut self, id: u64) -> bool {
        self.pump();
        self.hidden.get(&WindowId::new(id)).copied().unwrap_or(false)
    }

    pub fn last_stack(&mut self) -> Option<Vec<WindowId>> {
        self.pump();
        self.stack.clone()
    }

    /// Feed worker completions back in until one arrives or time runs out.
    pub fn wait_for_work(&mut self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(completion) = self.reactor.workers.recv_timeout(Duration::from_millis(50)) {
                if let Some(error) = completion.into_error() {
                    self.reactor.report(error);
                }
                self.event(Event::WorkCompleted);
                return;
            }
        }
        panic!("no work completed in time");
    }
}
