use tracing::{debug, trace};

use crate::actor::dispatcher::{Action, ActionResult, DispatchContext};
use crate::actor::reactor::Reactor;
use crate::actor::reactor::events::command::CommandEventHandler;
use crate::common::config::BringFrontClick;
use crate::common::error::Result;
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::hotkey::Hotkey;

const MIN_DRAG_SIZE: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize,
}

/// A mouse drag in progress. Motion is applied relative to where it began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub window: WindowId,
    pub kind: DragKind,
    pub start_point: Point,
    pub start_frame: Rect,
}

impl DragState {
    fn frame_at(&self, point: Point) -> Rect {
        let (dx, dy) = (point.x - self.start_point.x, point.y - self.start_point.y);
        let f = self.start_frame;
        match self.kind {
            DragKind::Move => f.translate(dx, dy),
            DragKind::Resize => Rect::new(
                f.x,
                f.y,
                (f.width + dx).max(MIN_DRAG_SIZE),
                (f.height + dy).max(MIN_DRAG_SIZE),
            ),
        }
    }
}

pub struct DragEventHandler;

impl DragEventHandler {
    pub fn handle_button_pressed(reactor: &mut Reactor, trigger: Hotkey, point: Point) -> Result<()> {
        reactor.pointer = point;
        Self::focus_screen_at(reactor, point);

        let under = reactor.window_at(point);
        if let Some(id) = under {
            reactor.focus_window(id);
            let raise = match reactor.config.settings.bring_front_click {
                BringFrontClick::Never => false,
                BringFrontClick::Always => true,
                BringFrontClick::FloatingOnly => {
                    reactor.window(id).is_some_and(|w| w.state.is_floating())
                }
            };
            if raise {
                reactor.registry.raise(id)?;
            }
        }

        let focused = under.and_then(|id| reactor.registry.get(id).ok());
        match reactor.dispatcher.dispatch(trigger, DispatchContext { focused }) {
            ActionResult::Run(Action::DragMove) => Self::start_drag(reactor, under, DragKind::Move, point),
            ActionResult::Run(Action::DragResize) => {
                Self::start_drag(reactor, under, DragKind::Resize, point)
            }
            ActionResult::Run(action) => CommandEventHandler::handle_action(reactor, action),
            other => {
                trace!(%trigger, ?other, "button not handled");
                Ok(())
            }
        }
    }

    pub fn handle_button_released(reactor: &mut Reactor, point: Point) {
        reactor.pointer = point;
        if let Some(drag) = reactor.drag.take() {
            debug!(window = %drag.window, "drag finished");
        }
    }

    pub fn handle_pointer_moved(reactor: &mut Reactor, point: Point) -> Result<()> {
        reactor.pointer = point;
        if let Some(drag) = reactor.drag {
            let frame = drag.frame_at(point);
            let window = reactor.registry.get_mut(drag.window)?;
            window.float_frame = Some(frame);
            return Ok(());
        }

        Self::focus_screen_at(reactor, point);
        if reactor.config.settings.follow_mouse_focus {
            if let Some(id) = reactor.window_at(point) {
                if reactor.focused != Some(id) {
                    reactor.focus_window(id);
                }
            }
        }
        Ok(())
    }

    /// Dragging a tiled window floats it where it currently is.
    fn start_drag(
        reactor: &mut Reactor,
        window: Option<WindowId>,
        kind: DragKind,
        point: Point,
    ) -> Result<()> {
        let Some(id) = window else { return Ok(()) };
        let w = reactor.registry.get_mut(id)?;
        if w.state.is_fullscreen() || w.state.is_minimized() {
            return Ok(());
        }
        let start_frame = if w.state.is_floating() { w.float_frame.unwrap_or(w.frame) } else { w.frame };
        if w.state.set_floating(true) {
            w.float_frame = Some(start_frame);
            reactor.sync_layout_membership(id);
        }
        reactor.registry.raise(id)?;
        debug!(window = %id, ?kind, "drag started");
        reactor.drag = Some(DragState {
            window: id,
            kind,
            start_point: point,
            start_frame,
        });
        Ok(())
    }

    /// The pointer decides which screen has focus.
    fn focus_screen_at(reactor: &mut Reactor, point: Point) {
        let Some(idx) = reactor.groups.screens().iter().position(|s| s.frame.contains(point)) else {
            return;
        };
        if idx == reactor.groups.focused_screen() {
            return;
        }
        if reactor.groups.set_focused_screen(idx).is_ok() {
            let group = reactor.current_group();
            if reactor.focused.and_then(|id| reactor.groups.group_of(id)) != group {
                reactor.focused = None;
                reactor.refocus();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor::reactor::Event;
    use crate::actor::reactor::testing::*;
    use crate::model::{ScreenId, ScreenSpec, WindowState};

    const MOUSE: &str = r#"
        groups = ["1", "2"]
        layouts = [{ kind = "columns", border_width = 0 }]

        [settings]
        bring_front_click = "floating_only"

        [[mouse]]
        trigger = "Super + Button1"
        action = "drag_move"

        [[mouse]]
        trigger = "Super + Button3"
        action = "drag_resize"
    "#;

    fn press(h: &mut Harness, trigger: &str, x: i32, y: i32) {
        h.event(Event::ButtonPressed {
            trigger: trigger.parse().unwrap(),
            point: Point::new(x, y),
        });
    }

    fn motion(h: &mut Harness, x: i32, y: i32) {
        h.event(Event::PointerMoved { point: Point::new(x, y) });
    }

    #[test]
    fn dragging_a_tiled_window_floats_and_moves_it() {
        let mut h = Harness::new(MOUSE);
        h.map_windows(2);
        press(&mut h, "Super + Button1", 100, 100);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert_eq!(h.reactor.window(WindowId::new(1)).map(|w| w.state), Some(WindowState::Floating));
        assert_eq!(h.frame(2), Some(Rect::new(0, 0, 1200, 800)));

        motion(&mut h, 150, 130);
        assert_eq!(h.frame(1), Some(Rect::new(50, 30, 600, 800)));
        h.event(Event::ButtonReleased { point: Point::new(150, 130) });
        motion(&mut h, 400, 400);
        assert_eq!(h.frame(1), Some(Rect::new(50, 30, 600, 800)));
    }

    #[test]
    fn resize_drag_keeps_a_minimum_size() {
        let mut h = Harness::new(MOUSE);
        h.map_windows(1);
        press(&mut h, "Super + Button3", 600, 400);
        motion(&mut h, 100, 100);
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, 700, 500)));
        motion(&mut h, -2000, -2000);
        assert_eq!(h.frame(1), Some(Rect::new(0, 0, MIN_DRAG_SIZE, MIN_DRAG_SIZE)));
    }

    #[test]
    fn focus_follows_mouse() {
        let mut h = Harness::new(MOUSE);
        h.map_windows(2);
        motion(&mut h, 10, 10);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        motion(&mut h, 900, 10);
        assert_eq!(h.reactor.focused, Some(WindowId::new(2)));
    }

    #[test]
    fn pointer_focus_skips_windows_hidden_by_the_layout() {
        let mut h = Harness::new(
            r#"
            groups = ["1"]
            layouts = [{ kind = "max", border_width = 0 }]
        "#,
        );
        h.map_windows(2);
        h.command(Action::FocusNext);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert!(h.hidden(2));

        motion(&mut h, 10, 10);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert!(h.hidden(2));
        press(&mut h, "Button1", 10, 10);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
    }

    #[test]
    fn plain_click_focuses_without_raising_tiled_windows() {
        let mut h = Harness::new(MOUSE);
        h.map_windows(2);
        let before = h.last_stack();
        press(&mut h, "Button1", 10, 10);
        assert_eq!(h.reactor.focused, Some(WindowId::new(1)));
        assert_eq!(h.last_stack(), before);
    }

    #[test]
    fn pointer_moves_focus_between_screens() {
        let mut h = Harness::new(MOUSE);
        h.event(Event::ScreensChanged {
            screens: vec![
                ScreenSpec { id: ScreenId::new(0), frame: Rect::new(0, 0, 1200, 800) },
                ScreenSpec { id: ScreenId::new(1), frame: Rect::new(1200, 0, 1200, 800) },
            ],
        });
        h.map_windows(1);
        motion(&mut h, 1500, 100);
        assert_eq!(h.reactor.groups.focused_screen(), 1);
        assert_eq!(h.reactor.focused, None);
    }
}
