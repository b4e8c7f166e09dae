use serde::{Deserialize, Serialize};

use crate::common::config::FloatingSettings;
use crate::layout_engine::utils::{DEFAULT_WEIGHT, WindowStack};
use crate::layout_engine::{ArrangeContext, Arrangement, Direction, Layout, Placement, Slot};
use crate::model::WindowId;
use crate::sys::geometry::Rect;

/// Leaves every window where it is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Floating {
    settings: FloatingSettings,
    stack: WindowStack,
}

impl Floating {
    pub fn new(settings: FloatingSettings) -> Self {
        Self {
            settings,
            stack: WindowStack::default(),
        }
    }
}

impl Layout for Floating {
    fn name(&self) -> &str { self.settings.name.as_deref().unwrap_or("floating") }

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

    /// Windows without a known frame are centred at half the region size.
    fn arrange(&self, region: Rect, ctx: ArrangeContext<'_>) -> Arrangement {
        let fallback = {
            let (w, h) = (region.width / 2, region.height / 2);
            let c = region.center();
            Rect::new(c.x - w / 2, c.y - h / 2, w, h)
        };
        let border = self.settings.border_width;
        Arrangement {
            placements: self
                .stack
                .windows
                .iter()
                .map(|wid| {
                    let frame = ctx.frames.get(wid).copied().filter(|f| !f.is_empty()).unwrap_or(fallback);
                    (*wid, Placement::Visible { frame, border })
                })
                .collect(),
        }
    }

    fn focus_direction(&mut self, direction: Direction) -> Option<WindowId> {
        if direction.is_forward() { self.focus_next() } else { self.focus_previous() }
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
    use crate::common::collections::HashMap;

    #[test]
    fn reports_own_geometry() {
        let mut l = Floating::new(FloatingSettings::default());
        l.add_window(WindowId::new(1));
        l.add_window(WindowId::new(2));
        let mut frames = HashMap::default();
        frames.insert(WindowId::new(1), Rect::new(5, 6, 70, 80));
        let arr = l.arrange(Rect::new(0, 0, 1000, 800), ArrangeContext { frames: &frames });
        assert_eq!(arr.get(WindowId::new(1)).and_then(|p| p.frame()), Some(Rect::new(5, 6, 70, 80)));
        assert_eq!(
            arr.get(WindowId::new(2)).and_then(|p| p.frame()),
            Some(Rect::new(250, 200, 500, 400))
        );
    }
}
