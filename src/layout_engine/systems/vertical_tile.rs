use serde::{Deserialize, Serialize};

use crate::common::config::VerticalTileSettings;
use crate::layout_engine::utils::{DEFAULT_WEIGHT, WindowStack, grow_weights};
use crate::layout_engine::{
    ArrangeContext, Arrangement, Direction, Layout, Orientation, Placement, Slot,
};
use crate::model::WindowId;
use crate::sys::geometry::{Insets, Rect, split_weighted};

/// Full-width windows stacked top to bottom with adjustable heights.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerticalTile {
    settings: VerticalTileSettings,
    stack: WindowStack,
    heights: Vec<f64>,
}

impl VerticalTile {
    pub fn new(settings: VerticalTileSettings) -> Self {
        Self {
            settings,
            stack: WindowStack::default(),
            heights: Vec::new(),
        }
    }
}

impl Layout for VerticalTile {
    fn name(&self) -> &str { self.settings.name.as_deref().unwrap_or("vertical_tile") }

    fn add_window(&mut self, wid: WindowId) {
        if self.stack.position(wid).is_none() {
            let at = self.stack.insert_after_focus(wid);
            self.heights.insert(at, DEFAULT_WEIGHT);
        }
    }

    fn remove_window(&mut self, wid: WindowId) -> bool {
        let Some(idx) = self.stack.remove(wid) else { return false };
        self.heights.remove(idx);
        true
    }

    fn detach(&mut self, wid: WindowId) -> Option<Slot> {
        let index = self.stack.position(wid)?;
        let weight = self.heights[index];
        self.remove_window(wid);
        Some(Slot::in_list(self.stack.windows.clone(), index, weight))
    }

    fn reattach(&mut self, wid: WindowId, slot: &Slot) -> bool {
        if !slot.fits_list(&self.stack.windows) {
            return false;
        }
        let at = self.stack.insert_at(slot.index, wid);
        self.heights.insert(at, slot.weight);
        true
    }

    fn windows(&self) -> Vec<WindowId> { self.stack.windows.clone() }

    fn focused(&self) -> Option<WindowId> { self.stack.focused() }

    fn focus(&mut self, wid: WindowId) -> bool { self.stack.focus(wid) }

    fn arrange(&self, region: Rect, _ctx: ArrangeContext<'_>) -> Arrangement {
        let insets = Insets::uniform(self.settings.margin);
        let border = self.settings.border_width;
        let tiles = split_weighted(region, &self.heights, Orientation::Vertical, 0);
        Arrangement {
            placements: self
                .stack
                .windows
                .iter()
                .zip(tiles)
                .map(|(wid, tile)| (*wid, Placement::Visible { frame: tile.shrink(insets), border }))
                .collect(),
        }
    }

    fn focus_direction(&mut self, direction: Direction) -> Option<WindowId> {
        if direction.orientation() != Orientation::Vertical {
            return None;
        }
        let next = direction.step(self.stack.focused, self.stack.len())?;
        self.stack.focused = next;
        self.stack.focused()
    }

    fn shuffle(&mut self, direction: Direction) -> bool {
        if direction.orientation() != Orientation::Vertical {
            return false;
        }
        let from = self.stack.focused;
        if !self.stack.swap_focused(direction.is_forward()) {
            return false;
        }
        self.heights.swap(from, self.stack.focused);
        true
    }

    fn grow(&mut self, direction: Direction, region: Rect) -> bool {
        if direction.orientation() != Orientation::Vertical {
            return false;
        }
        grow_weights(
            &mut self.heights,
            self.stack.focused,
            direction.is_forward(),
            self.settings.grow_amount,
            region,
            Orientation::Vertical,
            self.settings.min_tile_size,
        )
    }

    fn normalize(&mut self) { self.heights.iter_mut().for_each(|h| *h = DEFAULT_WEIGHT); }
}
