use tracing::{debug, info, trace, warn};

use crate::actor::dispatcher::{Action, ActionResult, DispatchContext};
use crate::actor::reactor::events::system::SystemEventHandler;
use crate::actor::reactor::events::window::WindowEventHandler;
use crate::actor::reactor::{Reactor, Request};
use crate::actor::worker::Job;
use crate::common::error::{Result, WmError};
use crate::layout_engine::Layout;
use crate::model::{WindowAttr, WindowId};
use crate::sys::hotkey::Hotkey;

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_trigger(reactor: &mut Reactor, trigger: Hotkey) {
        let focused = reactor.focused.and_then(|id| reactor.registry.get(id).ok());
        let result = reactor.dispatcher.dispatch(trigger, DispatchContext { focused });
        match result {
            ActionResult::Run(action) => {
                if let Err(e) = Self::handle_action(reactor, action) {
                    reactor.report(e);
                }
            }
            ActionResult::Ignored => debug!(%trigger, "binding does not apply to the focused window"),
            ActionResult::Unbound => trace!(%trigger, "unbound"),
            ActionResult::ChordEntered(chord) => debug!(%chord, "chord entered"),
            ActionResult::ChordLeft => debug!("chord left"),
        }
    }

    pub fn handle_action(reactor: &mut Reactor, action: Action) -> Result<()> {
        info!(?action);
        let rearranges = matches!(
            action,
            Action::Shuffle(_)
                | Action::Grow(_)
                | Action::Normalize
                | Action::ToggleSplit
                | Action::NextLayout
                | Action::PreviousLayout
                | Action::SetLayout(_)
        );
        Self::run_action(reactor, action)?;
        if rearranges {
            reactor.unpin_current_group();
        }
        Ok(())
    }

    fn run_action(reactor: &mut Reactor, action: Action) -> Result<()> {
        match action {
            Action::Focus(direction) => {
                let target = reactor
                    .current_layouts()
                    .and_then(|set| set.current_mut().focus_direction(direction));
                if let Some(id) = target {
                    reactor.focus_from_command(id);
                }
            }
            Action::FocusNext => Self::cycle_focus(reactor, true),
            Action::FocusPrevious => Self::cycle_focus(reactor, false),
            Action::Shuffle(direction) => {
                if let Some(set) = reactor.current_layouts() {
                    set.current_mut().shuffle(direction);
                }
            }
            Action::Grow(direction) => {
                let Some(group) = reactor.current_group() else { return Ok(()) };
                let Some(region) = reactor.group_region(group) else { return Ok(()) };
                let Some(set) = reactor.layouts.get_mut(group) else { return Ok(()) };
                if !set.current_mut().grow(direction, region) {
                    return Err(WmError::GeometryConstraintViolation(format!(
                        "cannot grow {direction:?} in {}",
                        set.current().name()
                    )));
                }
            }
            Action::Normalize => {
                if let Some(set) = reactor.current_layouts() {
                    set.current_mut().normalize();
                }
            }
            Action::ToggleSplit => {
                if let Some(set) = reactor.current_layouts() {
                    set.current_mut().toggle_split();
                }
            }
            Action::NextLayout => {
                if let Some(set) = reactor.current_layouts() {
                    set.next();
                }
            }
            Action::PreviousLayout => {
                if let Some(set) = reactor.current_layouts() {
                    set.previous();
                }
            }
            Action::SetLayout(name) => {
                if let Some(set) = reactor.current_layouts() {
                    if !set.select(&name) && set.current().name() != name {
                        warn!(layout = %name, "layout is not available in this group");
                    }
                }
            }

            Action::Kill => {
                if let Some(window) = reactor.focused {
                    reactor.send_request(Request::Close { window });
                }
            }
            Action::ToggleFullscreen => {
                let Some(id) = reactor.focused else { return Ok(()) };
                if reactor.registry.get_mut(id)?.state.toggle_fullscreen() {
                    reactor.sync_layout_membership(id);
                }
            }
            Action::ToggleFloating => {
                let Some(id) = reactor.focused else { return Ok(()) };
                Self::toggle_floating(reactor, id)?;
            }
            Action::ToggleMinimize => Self::toggle_minimize(reactor)?,
            Action::BringToFront => {
                if let Some(id) = reactor.focused {
                    reactor.registry.raise(id)?;
                }
            }
            Action::DragMove | Action::DragResize => {
                debug!("drag actions only apply to mouse bindings");
            }

            Action::ToScreen(label) => {
                let group = reactor.groups.group_by_label(&label)?;
                let screen = reactor.groups.focused_screen();
                reactor.groups.switch_to(screen, group)?;
                reactor.focused = None;
                reactor.refocus();
            }
            Action::ToGroup { group, follow } => {
                let Some(id) = reactor.focused else { return Ok(()) };
                Self::move_to_group(reactor, id, &group, follow)?;
            }

            Action::Spawn(command) => Self::spawn(reactor, command),
            Action::Brightness { step, increase } => reactor.workers.submit(Job::Brightness {
                device: reactor.config.settings.backlight_device.clone(),
                step,
                increase,
            }),
            Action::ChangeVt(vt) => reactor.send_request(Request::ChangeVt { vt }),
            Action::EnterChord(name) => {
                if !reactor.dispatcher.enter_chord(&name) {
                    warn!(chord = %name, "no such chord");
                }
            }
            Action::LeaveChord => {
                reactor.dispatcher.leave_chord();
            }
            Action::ReloadConfig => match reactor.live.stage_reload() {
                Ok(()) => SystemEventHandler::handle_config_reloaded(reactor),
                Err(e) => SystemEventHandler::handle_config_failed(reactor, e.to_string()),
            },
            Action::Shutdown => {
                reactor.shutting_down = true;
                reactor.send_request(Request::Shutdown);
            }
        }
        Ok(())
    }

    pub fn spawn(reactor: &mut Reactor, command: String) {
        reactor.workers.submit(Job::Spawn { command });
    }

    /// Next/previous over the layout's order, then any floating windows of
    /// the group.
    fn cycle_focus(reactor: &mut Reactor, forward: bool) {
        let Some(group) = reactor.current_group() else { return };
        let mut order =
            reactor.layouts.get(group).map(|set| set.current().windows()).unwrap_or_default();
        if let Ok(g) = reactor.groups.group(group) {
            for id in g.windows() {
                if !order.contains(id) && reactor.is_window_visible(*id) {
                    order.push(*id);
                }
            }
        }
        if order.is_empty() {
            return;
        }
        let len = order.len();
        let next = match reactor.focused.and_then(|f| order.iter().position(|w| *w == f)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        reactor.focus_from_command(order[next]);
    }

    fn toggle_floating(reactor: &mut Reactor, id: WindowId) -> Result<()> {
        let window = reactor.registry.get_mut(id)?;
        let frame = window.frame;
        if !window.state.toggle_floating() {
            return Ok(());
        }
        if window.state.is_floating() && window.float_frame.is_none() {
            window.float_frame = Some(frame);
        }
        reactor.sync_layout_membership(id);
        Ok(())
    }

    /// Minimize the focused window, or bring back the most recently
    /// minimized window of the current group when nothing is focused.
    fn toggle_minimize(reactor: &mut Reactor) -> Result<()> {
        if let Some(id) = reactor.focused {
            if !reactor.registry.get(id)?.state.is_minimized() {
                return WindowEventHandler::minimize(reactor, id);
            }
        }
        let group = reactor.current_group();
        let candidate = reactor
            .minimized
            .iter()
            .copied()
            .find(|id| group.is_some() && reactor.groups.group_of(*id) == group);
        if let Some(id) = candidate {
            WindowEventHandler::restore(reactor, id)?;
            reactor.focus_from_command(id);
        }
        Ok(())
    }

    fn move_to_group(reactor: &mut Reactor, id: WindowId, label: &str, follow: bool) -> Result<()> {
        let target = reactor.groups.group_by_label(label)?;
        let source = reactor.registry.get(id)?.group;
        reactor.groups.move_window(id, target, follow)?;
        if source != target {
            if let Some(set) = reactor.layouts.get_mut(source) {
                set.remove_window(id);
            }
            reactor.registry.set_attr(id, WindowAttr::Group(target))?;
            reactor.sync_layout_membership(id);
        }
        if follow {
            reactor.focus_window(id);
        } else {
            reactor.focused = None;
            reactor.refocus();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::actor::reactor::Event;
    use crate::actor::broadcast::BroadcastEvent;
    use crate::actor::reactor::testing::*;
    use crate::layout_engine::Direction;
    use crate::sys::geometry::Rect;

    #[test]
    fn keys_resolve_through_the_dispatcher() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.key("Super + j");
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        h.key("Super + Ctrl + j");
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
    }

    #[test]
    fn next_and_previous_wrap() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(3);
        h.command(Action::FocusNext);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        h.command(Action::FocusPrevious);
        assert_eq!(h.reactor.focused, Some(WindowId::new(3)));
    }

    #[test]
    fn shuffle_grow_and_normalize() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.command(Action::Shuffle(Direction::Left));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 1200, 400)));
        assert_eq!(h.frame(2), Some(Rect::new(0, 400, 1200, 400)));
        h.command(Action::Shuffle(Direction::Up));
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 400)));
        h.command(Action::Grow(Direction::Down));
        assert_eq!(h.frame(2).map(|f| f.height), Some(440));
        h.command(Action::Normalize);
        assert_eq!(h.frame(2).map(|f| f.height), Some(400));
    }

    #[test]
    fn kill_asks_the_compositor() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(1);
        h.requests();
        h.command(Action::Kill);
        assert_eq!(h.requests(), vec![Request::Close { window: WindowId::new(1) }]);
    }

    #[test]
    fn set_layout_switches_to_named_layout() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.command(Action::SetLayout("max".into()));
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));
        assert!(h.hidden(1));
    }

    #[test]
    fn change_vt_is_forwarded() {
        let mut h = Harness::new(TEST_CONFIG);
        h.requests();
        h.command(Action::ChangeVt(2));
        assert_eq!(h.requests(), vec![Request::ChangeVt { vt: 2 }]);
    }

    #[test]
    fn failed_spawn_is_broadcast() {
        let mut h = Harness::new(TEST_CONFIG);
        h.broadcasts();
        h.command(Action::Spawn("definitely-not-a-real-binary-5f1c".into()));
        h.wait_for_work();
        let events = h.broadcasts();
        assert!(events.iter().any(|e| matches!(e, BroadcastEvent::ExternalActionFailed { .. })));
    }

    #[test]
    fn move_without_follow_keeps_screen() {
        let mut h = Harness::new(TEST_CONFIG);
        h.map_windows(2);
        h.command(Action::ToGroup { group: "2".into(), follow: false });
        assert!(h.hidden(2));
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 1200, 800)));
        h.command(Action::ToScreen("2".into()));
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));
        h.event(Event::WindowUnmapped { id: WindowId::new(2) });
        assert_eq!(h.reactor.focused, None);
    }
}
