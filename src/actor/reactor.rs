//! The Reactor's job is to keep the model coherent with what the compositor
//! reports.
//!
//! It takes events from the rest of the system, updates the registry, the
//! groups and the layouts, then sends the compositor whatever requests are
//! needed to make the screen match. Requests are diffed against what was last
//! sent, and bar broadcasts are diffed against the last committed state, so
//! nothing is sent for intermediate states.

mod events;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::actor::broadcast::{BarState, BroadcastEvent, BroadcastSender, GroupStatus};
use crate::actor::config_watcher::LiveConfig;
use crate::actor::dispatcher::{Action, Dispatcher};
use crate::actor::worker::WorkerPool;
use crate::actor::{self};
use crate::common::collections::{BTreeMap, HashMap};
use crate::common::config::{Config, FloatingSettings, LayoutSpec};
use crate::common::error::WmError;
use crate::layout_engine::{ArrangeContext, GroupLayouts, Layout, LayoutSet, Placement};
use crate::model::window::BaseState;
use crate::model::{
    GroupId, GroupManager, ManagedWindow, ScreenSpec, WindowId, WindowInfo, WindowRegistry,
    WindowState,
};
use crate::sys::geometry::{Point, Rect};
use crate::sys::hotkey::Hotkey;
use events::command::CommandEventHandler;
use events::drag::{DragEventHandler, DragState};
use events::system::SystemEventHandler;
use events::window::WindowEventHandler;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;
pub type RequestSender = actor::Sender<Request>;
pub type RequestReceiver = actor::Receiver<Request>;

/// Input to the reactor. Compositor events arrive as JSON; the rest are
/// produced inside the process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum Event {
    WindowMapped {
        id: WindowId,
        #[serde(default)]
        info: WindowInfo,
    },
    WindowUnmapped {
        id: WindowId,
    },
    /// The geometry the compositor actually gave a window.
    WindowConfigured {
        id: WindowId,
        frame: Rect,
    },
    TitleChanged {
        id: WindowId,
        title: Option<String>,
    },
    KeyPressed {
        trigger: Hotkey,
    },
    ButtonPressed {
        trigger: Hotkey,
        point: Point,
    },
    ButtonReleased {
        point: Point,
    },
    PointerMoved {
        point: Point,
    },
    /// The full set of outputs. Always the first event on startup unless the
    /// screens were given on the command line.
    ScreensChanged {
        screens: Vec<ScreenSpec>,
    },
    ActivationRequested {
        id: WindowId,
    },
    FullscreenRequested {
        id: WindowId,
        fullscreen: bool,
    },
    MinimizeRequested {
        id: WindowId,
    },
    /// Run an action as if a binding had fired.
    Command {
        action: Action,
    },

    /// The worker pool has completions to drain.
    #[serde(skip)]
    WorkCompleted,
    /// The config watcher swapped in a new config.
    #[serde(skip)]
    ConfigReloaded,
    #[serde(skip)]
    ConfigFailed(String),
}

/// Output to the compositor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "request")]
pub enum Request {
    Configure {
        window: WindowId,
        frame: Rect,
        border: i32,
    },
    Hide {
        window: WindowId,
    },
    /// Bottom-to-top order of every visible window.
    Restack {
        windows: Vec<WindowId>,
    },
    Focus {
        window: Option<WindowId>,
    },
    Close {
        window: WindowId,
    },
    WarpPointer {
        point: Point,
    },
    ChangeVt {
        vt: u8,
    },
    Shutdown,
}

pub struct Reactor {
    live: Arc<LiveConfig>,
    /// Changes together with the dispatcher's bindings and the layouts, only
    /// when a reload is applied.
    config: Arc<Config>,
    registry: WindowRegistry,
    groups: GroupManager,
    layouts: GroupLayouts,
    dispatcher: Dispatcher,
    focused: Option<WindowId>,
    /// Most recently minimized first.
    minimized: Vec<WindowId>,
    drag: Option<DragState>,
    pointer: Point,
    workers: WorkerPool,
    requests_tx: RequestSender,
    broadcast_tx: Option<BroadcastSender>,
    sent_placements: HashMap<WindowId, Placement>,
    sent_stack: Vec<WindowId>,
    sent_focus: Option<WindowId>,
    bar_state: BarState,
    shutting_down: bool,
}

impl Reactor {
    pub fn new(
        live: Arc<LiveConfig>,
        screens: &[ScreenSpec],
        workers: WorkerPool,
        requests_tx: RequestSender,
        broadcast_tx: Option<BroadcastSender>,
    ) -> Self {
        let state = live.load();
        let config = state.config.clone();
        let labels: Vec<String> = config.groups.iter().map(|g| g.name.clone()).collect();
        let groups = GroupManager::new(&labels, screens, config.settings.bar.reservation());
        let layouts = build_layouts(&config, &groups);
        let dispatcher = Dispatcher::new(state.bindings.clone());
        let mut reactor = Reactor {
            live,
            config,
            registry: WindowRegistry::new(),
            groups,
            layouts,
            dispatcher,
            focused: None,
            minimized: Vec::new(),
            drag: None,
            pointer: Point::default(),
            workers,
            requests_tx,
            broadcast_tx,
            sent_placements: HashMap::default(),
            sent_stack: Vec::new(),
            sent_focus: None,
            bar_state: BarState::default(),
            shutting_down: false,
        };
        reactor.commit();
        reactor
    }

    pub async fn run(mut self, mut events: Receiver) {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            self.handle_event(event);
            if self.shutting_down {
                debug!("reactor shutting down");
                break;
            }
        }
    }

    /// Commands configured to run once at startup.
    pub fn run_startup_commands(&mut self) {
        for command in self.config.settings.run_on_start.clone() {
            CommandEventHandler::spawn(self, command);
        }
        self.commit();
    }

    pub fn is_shutting_down(&self) -> bool { self.shutting_down }

    fn log_event(&self, event: &Event) {
        match event {
            Event::PointerMoved { .. } | Event::WindowConfigured { .. } => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }
    }

    #[instrument(name = "reactor::handle_event", skip(self, event))]
    pub fn handle_event(&mut self, event: Event) {
        self.log_event(&event);

        let result = match event {
            Event::WindowMapped { id, info } => WindowEventHandler::handle_window_mapped(self, id, info),
            Event::WindowUnmapped { id } => WindowEventHandler::handle_window_unmapped(self, id),
            Event::WindowConfigured { id, frame } => {
                WindowEventHandler::handle_window_configured(self, id, frame)
            }
            Event::TitleChanged { id, title } => {
                WindowEventHandler::handle_title_changed(self, id, title)
            }
            Event::ActivationRequested { id } => {
                WindowEventHandler::handle_activation_requested(self, id)
            }
            Event::FullscreenRequested { id, fullscreen } => {
                WindowEventHandler::handle_fullscreen_requested(self, id, fullscreen)
            }
            Event::MinimizeRequested { id } => {
                WindowEventHandler::handle_minimize_requested(self, id)
            }
            Event::KeyPressed { trigger } => {
                CommandEventHandler::handle_trigger(self, trigger);
                Ok(())
            }
            Event::Command { action } => CommandEventHandler::handle_action(self, action),
            Event::ButtonPressed { trigger, point } => {
                DragEventHandler::handle_button_pressed(self, trigger, point)
            }
            Event::ButtonReleased { point } => {
                DragEventHandler::handle_button_released(self, point);
                Ok(())
            }
            Event::PointerMoved { point } => DragEventHandler::handle_pointer_moved(self, point),
            Event::ScreensChanged { screens } => {
                SystemEventHandler::handle_screens_changed(self, screens);
                Ok(())
            }
            Event::WorkCompleted => {
                SystemEventHandler::handle_work_completed(self);
                Ok(())
            }
            Event::ConfigReloaded => {
                SystemEventHandler::handle_config_reloaded(self);
                Ok(())
            }
            Event::ConfigFailed(message) => {
                SystemEventHandler::handle_config_failed(self, message);
                Ok(())
            }
        };

        if let Err(e) = result {
            self.report(e);
        }
        self.commit();
    }

    fn report(&self, error: WmError) {
        match &error {
            WmError::UnknownHandle(_) | WmError::GeometryConstraintViolation(_) => {
                debug!("ignored: {error}")
            }
            WmError::ExternalActionFailure { action, reason } => {
                warn!("{error}");
                self.broadcast(BroadcastEvent::ExternalActionFailed {
                    action: action.clone(),
                    reason: reason.clone(),
                });
            }
            _ if error.is_recoverable() => warn!("{error}"),
            _ => {
                debug_assert!(false, "unexpected error in reactor: {error}");
                warn!("{error}");
            }
        }
    }

    fn send_request(&self, request: Request) {
        trace!(?request, "request");
        self.requests_tx.send(request);
    }

    fn broadcast(&self, event: BroadcastEvent) {
        if let Some(tx) = &self.broadcast_tx {
            tx.send(event);
        }
    }

    // Model helpers shared by the event handlers.

    fn window(&self, id: WindowId) -> Option<&ManagedWindow> { self.registry.get(id).ok() }

    fn focused_window(&self) -> Option<&ManagedWindow> {
        self.focused.and_then(|id| self.window(id))
    }

    /// Group commands act on: the one shown on the focused screen.
    fn current_group(&self) -> Option<GroupId> { self.groups.focused_group() }

    fn current_layouts(&mut self) -> Option<&mut LayoutSet> {
        let group = self.current_group()?;
        self.layouts.get_mut(group)
    }

    /// Region a group is laid out in, if it is visible.
    fn group_region(&self, group: GroupId) -> Option<Rect> {
        let idx = self.groups.screen_of(group)?;
        self.groups.screen(idx).map(|s| s.usable())
    }

    fn is_window_visible(&self, id: WindowId) -> bool {
        self.window(id)
            .is_some_and(|w| !w.state.is_minimized() && self.groups.is_visible(w.group))
    }

    /// Tiled windows, and fullscreen windows that were tiled, are members of
    /// their group's layouts; everything else is kept out. A window that
    /// leaves keeps its slot and goes back into it when tiled again.
    fn sync_layout_membership(&mut self, id: WindowId) {
        let Some(window) = self.window(id) else { return };
        let group = window.group;
        let tiled = matches!(
            window.state,
            WindowState::Normal | WindowState::Fullscreen { prior: BaseState::Tiled }
        );
        let Some(set) = self.layouts.get_mut(group) else { return };
        let changed = match (tiled, set.contains(id)) {
            (true, false) => {
                set.restore_window(id);
                true
            }
            (false, true) => set.park_window(id),
            _ => false,
        };
        if changed {
            self.unpin(id);
        }
    }

    /// Forget a size the client insisted on, so the next layout pass asks
    /// for the tile size again.
    fn unpin(&mut self, id: WindowId) {
        if let Ok(window) = self.registry.get_mut(id) {
            window.fixed_size = None;
            window.refused = None;
        }
    }

    /// The current group was rearranged; pinned sizes no longer apply.
    fn unpin_current_group(&mut self) {
        if let Some(group) = self.current_group() {
            self.unpin_group(group);
        }
    }

    fn unpin_group(&mut self, group: GroupId) {
        let windows = self.groups.group(group).map(|g| g.windows().to_vec()).unwrap_or_default();
        for id in windows {
            self.unpin(id);
        }
    }

    /// Focus a window, applying focus-loss minimization to the one losing it.
    fn focus_window(&mut self, id: WindowId) {
        if !self.registry.contains(id) {
            return;
        }
        let previous = self.focused.replace(id);
        if previous != Some(id) {
            if let Some(prev) = previous {
                self.maybe_auto_minimize(prev);
            }
        }
        self.groups.set_last_focused(id);
        if let Ok(window) = self.registry.get_mut(id) {
            window.urgent = false;
            let group = window.group;
            if let Some(set) = self.layouts.get_mut(group) {
                set.focus(id);
            }
        }
    }

    fn maybe_auto_minimize(&mut self, id: WindowId) {
        if !self.config.settings.auto_minimize {
            return;
        }
        let Ok(window) = self.registry.get_mut(id) else { return };
        if window.minimize_on_focus_loss && window.state.minimize() {
            debug!(%id, "minimized on focus loss");
            self.minimized.retain(|w| *w != id);
            self.minimized.insert(0, id);
            self.sync_layout_membership(id);
        }
    }

    /// Pick a new focus after the focused window went away or the visible
    /// groups changed.
    fn refocus(&mut self) {
        if self.focused.is_some_and(|id| self.is_window_visible(id)) {
            return;
        }
        let Some(group) = self.current_group() else {
            self.focused = None;
            return;
        };
        let Ok(g) = self.groups.group(group) else { return };
        let candidate = g
            .last_focused()
            .filter(|id| self.is_window_visible(*id))
            .or_else(|| {
                self.layouts
                    .get(group)
                    .and_then(|set| set.current().focused())
                    .filter(|id| self.is_window_visible(*id))
            })
            .or_else(|| g.windows().iter().rev().copied().find(|id| self.is_window_visible(*id)));
        match candidate {
            Some(id) => {
                // A focus change forced by the model never auto-minimizes.
                self.focused = Some(id);
                self.groups.set_last_focused(id);
                if let Some(set) = self.layouts.get_mut(group) {
                    set.focus(id);
                }
            }
            None => self.focused = None,
        }
    }

    /// Focus from a keyboard command; warps the pointer when configured.
    fn focus_from_command(&mut self, id: WindowId) {
        self.focus_window(id);
        if self.config.settings.cursor_warp {
            if let Some(window) = self.window(id) {
                self.send_request(Request::WarpPointer {
                    point: window.frame.center(),
                });
            }
        }
    }

    /// Windows on screen right now, in group order. A window counts only
    /// once it was last placed visible, so windows the layout hides (such
    /// as the unfocused ones in max) are never hit by the pointer.
    fn visible_windows(&self) -> Vec<WindowId> {
        self.groups
            .screens()
            .iter()
            .filter_map(|s| s.group)
            .filter_map(|g| self.groups.group(g).ok())
            .flat_map(|g| g.windows().iter().copied())
            .filter(|id| {
                self.is_window_visible(*id)
                    && matches!(self.sent_placements.get(id), Some(Placement::Visible { .. }))
            })
            .collect()
    }

    fn window_at(&self, point: Point) -> Option<WindowId> {
        let visible = self.visible_windows();
        self.registry.window_at(&visible, point, self.config.settings.floats_kept_above)
    }

    fn floating_border(&self) -> i32 {
        self.config
            .layouts
            .iter()
            .find_map(|l| match l {
                LayoutSpec::Floating(s) => Some(s.border_width),
                _ => None,
            })
            .unwrap_or_else(|| FloatingSettings::default().border_width)
    }

    fn group_frames(&self, group: GroupId) -> HashMap<WindowId, Rect> {
        let Ok(group) = self.groups.group(group) else { return HashMap::default() };
        group
            .windows()
            .iter()
            .filter_map(|id| self.window(*id).map(|w| (*id, w.frame)))
            .collect()
    }

    /// Frame the current layout gives a window, ignoring any pinned size.
    fn tile_frame(&self, id: WindowId) -> Option<Rect> {
        let group = self.window(id)?.group;
        let region = self.group_region(group)?;
        let frames = self.group_frames(group);
        self.layouts
            .get(group)?
            .current()
            .arrange(region, ArrangeContext { frames: &frames })
            .get(id)?
            .frame()
    }

    /// Where every window should be right now.
    fn compute_placements(&self) -> BTreeMap<WindowId, Placement> {
        let mut placements = BTreeMap::new();
        let float_border = self.floating_border();
        for (gid, group) in self.groups.groups() {
            let region = self.groups.screen_of(gid).and_then(|idx| self.groups.screen(idx));
            let Some(screen) = region else {
                for id in group.windows() {
                    placements.insert(*id, Placement::Hidden);
                }
                continue;
            };
            let usable = screen.usable();
            let frames = self.group_frames(gid);
            let arrangement = self
                .layouts
                .get(gid)
                .map(|set| set.current().arrange(usable, ArrangeContext { frames: &frames }))
                .unwrap_or_default();

            for id in group.windows() {
                let Some(window) = self.window(*id) else { continue };
                let placement = match window.state {
                    WindowState::Minimized { .. } => Placement::Hidden,
                    WindowState::Fullscreen { .. } => Placement::Visible {
                        frame: screen.frame,
                        border: 0,
                    },
                    WindowState::Floating => Placement::Visible {
                        frame: window.float_frame.unwrap_or(window.frame),
                        border: float_border,
                    },
                    WindowState::Normal => match arrangement.get(*id) {
                        Some(Placement::Visible { frame, border }) => Placement::Visible {
                            frame: window.fixed_size.map_or(frame, |size| frame.with_size(size)),
                            border,
                        },
                        _ => Placement::Hidden,
                    },
                };
                placements.insert(*id, placement);
            }
        }
        placements
    }

    /// Bring the compositor in line with the model and notify the bar.
    fn commit(&mut self) {
        for (id, placement) in self.compute_placements() {
            if self.sent_placements.get(&id) == Some(&placement) {
                continue;
            }
            match placement {
                Placement::Visible { frame, border } => {
                    if let Ok(window) = self.registry.get_mut(id) {
                        window.frame = frame;
                    }
                    self.send_request(Request::Configure { window: id, frame, border });
                }
                Placement::Hidden => self.send_request(Request::Hide { window: id }),
            }
            self.sent_placements.insert(id, placement);
        }

        let visible = self.visible_windows();
        let stack = self.registry.stacking_order(&visible, self.config.settings.floats_kept_above);
        if stack != self.sent_stack {
            self.send_request(Request::Restack { windows: stack.clone() });
            self.sent_stack = stack;
        }

        if self.focused != self.sent_focus {
            self.send_request(Request::Focus { window: self.focused });
            self.sent_focus = self.focused;
        }

        let next = self.capture_bar_state();
        for event in self.bar_state.diff(&next) {
            self.broadcast(event);
        }
        self.bar_state = next;
    }

    fn capture_bar_state(&self) -> BarState {
        let mut state = BarState {
            focused_screen: self.groups.focused_screen(),
            focused_title: self.focused_window().map(|w| w.display_name().to_string()),
            chord: self.dispatcher.active_chord().map(str::to_string),
            ..Default::default()
        };
        for (gid, group) in self.groups.groups() {
            let screen = self.groups.screen_of(gid);
            state.groups.push(GroupStatus {
                label: group.label.clone(),
                screen,
                windows: group.windows().len(),
                urgent: group.windows().iter().any(|id| self.window(*id).is_some_and(|w| w.urgent)),
            });
            if let Some(set) = self.layouts.get(gid) {
                state.layouts.insert(group.label.clone(), set.current().name().to_string());
            }
            if screen.is_some() {
                let names = group
                    .windows()
                    .iter()
                    .filter_map(|id| self.window(*id))
                    .map(|w| w.display_name().to_string())
                    .collect();
                state.windows.insert(group.label.clone(), names);
            }
        }
        state
    }

    /// Rebuild every group's layouts from the current config, keeping
    /// windows and focus.
    fn rebuild_layouts(&mut self) {
        let mut layouts = build_layouts(&self.config, &self.groups);
        for (gid, group) in self.groups.groups() {
            let Some(set) = layouts.get_mut(gid) else { continue };
            for id in group.windows() {
                let tiled = self.window(*id).is_some_and(|w| {
                    matches!(
                        w.state,
                        WindowState::Normal | WindowState::Fullscreen { prior: BaseState::Tiled }
                    )
                });
                if tiled {
                    set.add_window(*id);
                }
            }
            if let Some(focus) = self.layouts.get(gid).and_then(|s| s.current().focused()) {
                set.focus(focus);
            }
        }
        self.layouts = layouts;
    }
}

fn build_layouts(config: &Config, groups: &GroupManager) -> GroupLayouts {
    let mut layouts = GroupLayouts::default();
    for (gid, group) in groups.groups() {
        let (specs, initial) = match config.groups.iter().find(|g| g.name == group.label) {
            Some(g) => g.layout_specs(&config.layouts),
            None => (config.layouts.clone(), 0),
        };
        layouts.insert(gid, LayoutSet::new(&specs, initial));
    }
    layouts
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::testing::*;
    use super::*;
    use crate::layout_engine::Direction;

    #[test]
    fn three_windows_tile_into_equal_columns() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 400, 800)));
        assert_eq!(h.frame(2), Some(Rect::new(400, 0, 400, 800)));
        assert_eq!(h.frame(3), Some(Rect::new(800, 0, 400, 800)));
        assert_eq!(h.reactor.focused, Some(WindowId::new(3)));
    }

    #[test]
    fn grow_middle_column_left() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.command(Action::Focus(Direction::Left));
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
        h.requests();
        h.command(Action::Grow(Direction::Left));
        assert_eq!(h.frame(1).map(|f| f.width), Some(360));
        assert_eq!(h.frame(2).map(|f| f.width), Some(440));
        assert_eq!(h.frame(3).map(|f| f.width), Some(400));
    }

    #[test]
    fn resize_below_minimum_sends_nothing() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        // Window 2 is focused; keep growing it left until the left tile
        // reaches its minimum.
        for _ in 0..40 {
            h.command(Action::Grow(Direction::Left));
        }
        assert!(h.frame(1).is_some_and(|f| f.width >= 50));
        let settled = h.frames.clone();
        h.requests();
        h.command(Action::Grow(Direction::Left));
        assert!(h.requests().is_empty());
        assert_eq!(h.frames, settled);
    }

    #[test]
    fn toggle_floating_twice_restores_geometry() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        let tiled = h.frames.clone();
        h.command(Action::ToggleFloating);
        assert_eq!(h.reactor.focused_window().map(|w| w.state), Some(WindowState::Floating));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 1200, 800)));
        h.command(Action::ToggleFloating);
        assert_eq!(h.reactor.focused_window().map(|w| w.state), Some(WindowState::Normal));
        assert_eq!(h.frames, tiled);
    }

    #[test]
    fn toggle_floating_twice_keeps_the_middle_column_in_place() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.command(Action::Focus(Direction::Left));
        let tiled = h.frames.clone();
        h.command(Action::ToggleFloating);
        assert_eq!(h.frame(3), Some(Rect::new(600, 0, 600, 800)));
        h.command(Action::ToggleFloating);
        assert_eq!(h.frame(2), Some(Rect::new(400, 0, 400, 800)));
        assert_eq!(h.frames, tiled);
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
    }

    #[test]
    fn toggle_floating_twice_keeps_a_grown_width() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.command(Action::Grow(Direction::Left));
        assert_eq!(h.frame(2).map(|f| f.width), Some(660));
        let tiled = h.frames.clone();
        h.command(Action::ToggleFloating);
        h.command(Action::ToggleFloating);
        assert_eq!(h.frame(1).map(|f| f.width), Some(540));
        assert_eq!(h.frame(2).map(|f| f.width), Some(660));
        assert_eq!(h.frames, tiled);
    }

    #[test]
    fn minimized_window_returns_to_its_column() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        let tiled = h.frames.clone();
        h.event(Event::MinimizeRequested { id: WindowId::new(1) });
        assert!(h.hidden(1));
        h.event(Event::ActivationRequested { id: WindowId::new(1) });
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 400, 800)));
        assert_eq!(h.frames, tiled);
    }

    #[test]
    fn layout_round_trip_keeps_weights_and_focus() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.command(Action::Focus(Direction::Left));
        h.command(Action::Grow(Direction::Left));
        let grown = h.frames.clone();
        h.command(Action::NextLayout);
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));
        h.command(Action::PreviousLayout);
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
        assert_eq!(h.frames, grown);
    }

    #[test]
    fn fullscreen_covers_screen_and_restores() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        let tiled = h.frames.clone();
        h.command(Action::ToggleFullscreen);
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));
        h.command(Action::ToggleFullscreen);
        assert_eq!(h.frames, tiled);
    }

    #[test]
    fn unmapping_focused_window_refocuses() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.event(Event::WindowUnmapped { id: WindowId::new(3) });
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
        assert_eq!(h.frame(1).map(|f| f.width), Some(600));
        // Stale handle is a no-op.
        h.requests();
        h.event(Event::WindowUnmapped { id: WindowId::new(3) });
        assert!(h.requests().is_empty());
    }

    #[test]
    fn switching_groups_hides_and_shows() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(1);
        h.requests();
        h.command(Action::ToScreen("2".into()));
        assert_eq!(h.requests(), vec![
            Request::Hide { window: WindowId::new(1) },
            Request::Restack { windows: vec![] },
            Request::Focus { window: None },
        ]);
        h.command(Action::ToScreen("1".into()));
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 1200, 800)));
    }

    #[test]
    fn move_window_to_group_with_follow() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.command(Action::ToGroup { group: "3".into(), follow: true });
        let group = h.reactor.groups.group_by_label("3").unwrap();
        assert_eq!(h.reactor.groups.focused_group(), Some(group));
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));
        assert_eq!(h.hidden(1), true);
    }

    #[test]
    fn rejected_size_is_pinned_without_looping() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.requests();
        // Window 1 insists on 500x300. One answer may be a race with a
        // newer request, so nothing is pinned yet.
        h.event(Event::WindowConfigured {
            id: WindowId::new(1),
            frame: Rect::new(0, 0, 500, 300),
        });
        assert!(h.requests().is_empty());
        h.event(Event::WindowConfigured {
            id: WindowId::new(1),
            frame: Rect::new(0, 0, 500, 300),
        });
        let requests = h.requests();
        assert_eq!(requests, vec![Request::Configure {
            window: WindowId::new(1),
            frame: Rect::new(0, 0, 500, 300),
            border: 0,
        }]);
        h.event(Event::WindowConfigured {
            id: WindowId::new(1),
            frame: Rect::new(0, 0, 500, 300),
        });
        assert!(h.requests().is_empty());
    }

    #[test]
    fn broadcasts_once_per_event() {
        let mut h = Harness::new(TEST_CONFIG);
        h.broadcasts();
        h.map_window(1, "term");
        let events = h.broadcasts();
        let focus_changes =
            events.iter().filter(|e| matches!(e, BroadcastEvent::FocusChanged { .. })).count();
        assert_eq!(focus_changes, 1);
        assert!(events.iter().any(|e| matches!(e, BroadcastEvent::WindowsChanged { .. })));
        h.command(Action::NextLayout);
        assert_eq!(h.broadcasts(), vec![BroadcastEvent::LayoutChanged {
            group: "1".into(),
            layout: "max".into(),
        }]);
    }

    #[test]
    fn dialogs_float_by_default() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(1);
        h.event(Event::WindowMapped {
            id: WindowId::new(9),
            info: WindowInfo {
                role: Some("dialog".into()),
                frame: Rect::new(100, 100, 300, 200),
                ..Default::default()
            },
        });
        assert_eq!(h.frame(9), Some(Rect::new(100, 100, 300, 200)));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 1200, 800)));
        // Floats sit above tiled windows.
        assert_eq!(h.last_stack(), Some(vec![WindowId::new(1), WindowId::new(9)]));
    }

    #[test]
    fn shutdown_is_requested() {
        let mut h = Harness::new(TEST_CONFIG);
        h.command(Action::Shutdown);
        assert!(h.reactor.is_shutting_down());
        assert!(h.requests().contains(&Request::Shutdown));
    }
}
