use serde::{Deserialize, Serialize};

use crate::common::config::ColumnsSettings;
use crate::layout_engine::utils::{DEFAULT_WEIGHT, WindowStack, grow_weights, step};
use crate::layout_engine::{
    ArrangeContext, Arrangement, Direction, Layout, Orientation, Placement, Slot,
};
use crate::model::WindowId;
use crate::sys::geometry::{Insets, Rect, split_weighted};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Column {
    stack: WindowStack,
    heights: Vec<f64>,
    width: f64,
    /// Split shows every window; unsplit shows only the focused one.
    split: bool,
}

impl Column {
    fn new(split: bool) -> Self {
        Self {
            stack: WindowStack::default(),
            heights: Vec::new(),
            width: DEFAULT_WEIGHT,
            split,
        }
    }

    fn with_window(wid: WindowId, split: bool) -> Self {
        let mut col = Self::new(split);
        col.insert(wid);
        col
    }

    fn insert(&mut self, wid: WindowId) {
        let at = self.stack.insert_after_focus(wid);
        self.heights.insert(at, DEFAULT_WEIGHT);
    }

    fn remove(&mut self, wid: WindowId) -> bool {
        match self.stack.remove(wid) {
            Some(idx) => {
                self.heights.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// Windows in vertical columns. A new window opens a column to the right of
/// the focused one until `max_columns` is reached, then joins the focused
/// column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Columns {
    settings: ColumnsSettings,
    columns: Vec<Column>,
    current: usize,
}

impl Columns {
    pub fn new(settings: ColumnsSettings) -> Self {
        Self {
            settings,
            columns: Vec::new(),
            current: 0,
        }
    }

    fn column_of(&self, wid: WindowId) -> Option<usize> {
        self.columns.iter().position(|c| c.stack.position(wid).is_some())
    }

    fn current_column(&self) -> Option<&Column> { self.columns.get(self.current) }

    fn at_column_limit(&self) -> bool {
        self.settings.max_columns.is_some_and(|max| self.columns.len() >= max.max(1))
    }

    fn drop_empty_column(&mut self, idx: usize) {
        if self.columns[idx].stack.is_empty() {
            self.columns.remove(idx);
            if self.current > idx || self.current >= self.columns.len() {
                self.current = self.current.saturating_sub(1);
            }
        }
    }

    fn shape(&self) -> Vec<Vec<WindowId>> {
        self.columns.iter().map(|c| c.stack.windows.clone()).collect()
    }

    fn window_insets(&self) -> Insets { Insets::uniform(self.settings.margin) }

    fn column_rects(&self, region: Rect) -> Vec<Rect> {
        let widths: Vec<f64> = self.columns.iter().map(|c| c.width).collect();
        split_weighted(region, &widths, Orientation::Horizontal, 0)
    }

    fn shuffle_horizontal(&mut self, forward: bool) -> bool {
        let Some(wid) = self.focused() else { return false };
        let src = self.current;
        match step(src, self.columns.len(), forward) {
            Some(dst) => {
                self.columns[src].remove(wid);
                self.columns[dst].insert(wid);
                self.current = dst;
                self.drop_empty_column(src);
                if let Some(idx) = self.column_of(wid) {
                    self.current = idx;
                }
            }
            None => {
                // At the edge a lone window has nowhere to go.
                if self.columns[src].stack.len() < 2 {
                    return false;
                }
                self.columns[src].remove(wid);
                let col = Column::with_window(wid, self.settings.split);
                if forward {
                    self.columns.push(col);
                    self.current = self.columns.len() - 1;
                } else {
                    self.columns.insert(0, col);
                    self.current = 0;
                }
            }
        }
        true
    }
}

impl Layout for Columns {
    fn name(&self) -> &str { self.settings.name.as_deref().unwrap_or("columns") }

    fn add_window(&mut self, wid: WindowId) {
        if self.column_of(wid).is_some() {
            return;
        }
        if self.columns.is_empty() || !self.at_column_limit() {
            let at = if self.columns.is_empty() { 0 } else { self.current + 1 };
            self.columns.insert(at, Column::with_window(wid, self.settings.split));
            self.current = at;
        } else {
            self.columns[self.current].insert(wid);
        }
    }

    fn remove_window(&mut self, wid: WindowId) -> bool {
        let Some(idx) = self.column_of(wid) else { return false };
        self.columns[idx].remove(wid);
        self.drop_empty_column(idx);
        true
    }

    fn detach(&mut self, wid: WindowId) -> Option<Slot> {
        let column = self.column_of(wid)?;
        let col = &self.columns[column];
        let index = col.stack.position(wid)?;
        let weight = col.heights[index];
        let column_weight = (col.stack.len() == 1).then_some(col.width);
        let split = col.split;
        self.remove_window(wid);
        Some(Slot {
            remaining: self.shape(),
            column,
            index,
            weight,
            column_weight,
            split,
        })
    }

    fn reattach(&mut self, wid: WindowId, slot: &Slot) -> bool {
        if self.column_of(wid).is_some() || self.shape() != slot.remaining {
            return false;
        }
        match slot.column_weight {
            Some(width) => {
                if slot.column > self.columns.len() {
                    return false;
                }
                let mut col = Column::with_window(wid, slot.split);
                col.width = width;
                self.columns.insert(slot.column, col);
            }
            None => {
                let Some(col) = self.columns.get_mut(slot.column) else { return false };
                let at = col.stack.insert_at(slot.index, wid);
                col.heights.insert(at, slot.weight);
            }
        }
        self.current = slot.column;
        true
    }

    fn windows(&self) -> Vec<WindowId> {
        self.columns.iter().flat_map(|c| c.stack.windows.iter().copied()).collect()
    }

    fn focused(&self) -> Option<WindowId> { self.current_column().and_then(|c| c.stack.focused()) }

    fn focus(&mut self, wid: WindowId) -> bool {
        let Some(idx) = self.column_of(wid) else { return false };
        self.current = idx;
        self.columns[idx].stack.focus(wid)
    }

    fn contains(&self, wid: WindowId) -> bool { self.column_of(wid).is_some() }

    fn arrange(&self, region: Rect, _ctx: ArrangeContext<'_>) -> Arrangement {
        let mut placements = Vec::new();
        let border = self.settings.border_width;
        let insets = self.window_insets();
        for (col, rect) in self.columns.iter().zip(self.column_rects(region)) {
            if col.split {
                let tiles = split_weighted(rect, &col.heights, Orientation::Vertical, 0);
                for (wid, tile) in col.stack.windows.iter().zip(tiles) {
                    placements.push((*wid, Placement::Visible { frame: tile.shrink(insets), border }));
                }
            } else {
                for (i, wid) in col.stack.windows.iter().enumerate() {
                    let placement = if i == col.stack.focused {
                        Placement::Visible { frame: rect.shrink(insets), border }
                    } else {
                        Placement::Hidden
                    };
                    placements.push((*wid, placement));
                }
            }
        }
        Arrangement { placements }
    }

    fn focus_direction(&mut self, direction: Direction) -> Option<WindowId> {
        match direction.orientation() {
            Orientation::Horizontal => {
                let next = direction.step(self.current, self.columns.len())?;
                self.current = next;
            }
            Orientation::Vertical => {
                let col = self.columns.get_mut(self.current)?;
                let next = direction.step(col.stack.focused, col.stack.len())?;
                col.stack.focused = next;
            }
        }
        self.focused()
    }

    fn shuffle(&mut self, direction: Direction) -> bool {
        if self.columns.is_empty() {
            return false;
        }
        match direction.orientation() {
            Orientation::Horizontal => self.shuffle_horizontal(direction.is_forward()),
            Orientation::Vertical => {
                let col = &mut self.columns[self.current];
                let from = col.stack.focused;
                if !col.stack.swap_focused(direction.is_forward()) {
                    return false;
                }
                col.heights.swap(from, col.stack.focused);
                true
            }
        }
    }

    fn grow(&mut self, direction: Direction, region: Rect) -> bool {
        if self.columns.is_empty() {
            return false;
        }
        let amount = self.settings.grow_amount;
        let min = self.settings.min_tile_size;
        match direction.orientation() {
            Orientation::Horizontal => {
                let mut widths: Vec<f64> = self.columns.iter().map(|c| c.width).collect();
                let ok = grow_weights(
                    &mut widths,
                    self.current,
                    direction.is_forward(),
                    amount,
                    region,
                    Orientation::Horizontal,
                    min,
                );
                if ok {
                    for (col, w) in self.columns.iter_mut().zip(widths) {
                        col.width = w;
                    }
                }
                ok
            }
            Orientation::Vertical => {
                let rect = self.column_rects(region)[self.current];
                let col = &mut self.columns[self.current];
                if !col.split {
                    return false;
                }
                grow_weights(
                    &mut col.heights,
                    col.stack.focused,
                    direction.is_forward(),
                    amount,
                    rect,
                    Orientation::Vertical,
                    min,
                )
            }
        }
    }

    fn normalize(&mut self) {
        for col in &mut self.columns {
            col.width = DEFAULT_WEIGHT;
            col.heights.iter_mut().for_each(|h| *h = DEFAULT_WEIGHT);
        }
    }

    fn toggle_split(&mut self) -> bool {
        match self.columns.get_mut(self.current) {
            Some(col) => {
                col.split = !col.split;
                true
            }
            None => false,
        }
    }
}
