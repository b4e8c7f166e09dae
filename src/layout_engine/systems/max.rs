use serde::{Deserialize, Serialize};

use crate::common::config::MaxSettings;
use crate::layout_engine::utils::{DEFAULT_WEIGHT, WindowStack};
use crate::layout_engine::{ArrangeContext, Arrangement, Direction, Layout, Placement, Slot};
use crate::model::WindowId;
use crate::sys::geometry::{Insets, Rect};

/// The focused window fills the region; everything else is hidden.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Max {
    settings: MaxSettings,
    stack: WindowStack,
}

impl Max {
    pub fn new(settings: MaxSettings) -> Self {
        Self {
            settings,
            stack: WindowStack::default(),
        }
    }
}

impl Layout for Max {
    fn name(&self) -> &str { self.settings.name.as_deref().unwrap_or("max") }

    fn add_window(&mut self, wid: WindowId) {
        if self.stack.position(wid).is_none() {
            self.stack.insert_after_focus(wid);
        }
    }

    fn remove_window(&mut self, wid: WindowId) -> bool { self.stack.remove(wid).is_some() }

    fn detach(&mut self, wid: WindowId) -> Option<Slot> {
        let index = self.stack.remove(wid)?;
        Some(Slot::in_list(self.stack.windows.clone(), index, DEFAULT_WEIGHT))
    }

    fn reattach(&mut self, wid: WindowId, slot: &Slot) -> bool {
        if !slot.fits_list(&self.stack.windows) {
            return false;
        }
        self.stack.insert_at(slot.index, wid);
        true
    }

    fn windows(&self) -> Vec<WindowId> { self.stack.windows.clone() }

    fn focused(&self) -> Option<WindowId> { self.stack.focused() }

    fn focus(&mut self, wid: WindowId) -> bool { self.stack.focus(wid) }

    fn arrange(&self, region: Rect, _ctx: ArrangeContext<'_>) -> Arrangement {
        let frame = region.shrink(Insets::uniform(self.settings.margin));
        let placements = self
            .stack
            .windows
            .iter()
            .enumerate()
            .map(|(i, wid)| {
                let placement = if i == self.stack.focused {
                    Placement::Visible {
                        frame,
                        border: self.settings.border_width,
                    }
                } else {
                    Placement::Hidden
                };
                (*wid, placement)
            })
            .collect();
        Arrangement { placements }
    }

    /// Up/left walk backwards through the list, down/right forwards.
    fn focus_direction(&mut self, direction: Direction) -> Option<WindowId> {
        let next = direction.step(self.stack.focused, self.stack.len())?;
        self.stack.focused = next;
        self.stack.focused()
    }

    fn shuffle(&mut self, direction: Direction) -> bool {
        self.stack.swap_focused(direction.is_forward())
    }

    fn grow(&mut self, _direction: Direction, _region: Rect) -> bool { false }

    fn normalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_engine::systems::no_frames;

    #[test]
    fn only_focused_is_visible() {
        let mut l = Max::new(MaxSettings::default());
        for i in 1..=3 {
            l.add_window(WindowId::new(i));
        }
        l.focus(WindowId::new(2));
        let region = Rect::new(0, 0, 1000, 700);
        let arr = l.arrange(region, ArrangeContext { frames: no_frames() });
        let visible: Vec<_> = arr.visible().collect();
        assert_eq!(visible, vec![(WindowId::new(2), region)]);
        assert_eq!(arr.get(WindowId::new(1)), Some(Placement::Hidden));
    }

    #[test]
    fn grow_does_nothing() {
        let mut l = Max::new(MaxSettings::default());
        l.add_window(WindowId::new(1));
        assert!(!l.grow(Direction::Left, Rect::new(0, 0, 10, 10)));
    }

    #[test]
    fn removing_focused_focuses_neighbour() {
        let mut l = Max::new(MaxSettings::default());
        for i in 1..=3 {
            l.add_window(WindowId::new(i));
        }
        assert!(l.remove_window(WindowId::new(3)));
        assert_eq!(l.focused(), Some(WindowId::new(2)));
        assert_eq!(l.focus_direction(Direction::Up), Some(WindowId::new(1)));
    }
}
