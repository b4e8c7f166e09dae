use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::common::config::LayoutSpec;
use crate::layout_engine::Direction;
use crate::model::WindowId;
use crate::sys::geometry::Rect;

mod columns;
mod floating;
mod max;
mod vertical_tile;

pub use columns::Columns;
pub use floating::Floating;
pub use max::Max;
pub use vertical_tile::VerticalTile;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "placement")]
pub enum Placement {
    /// Outer frame (border included) and the border width to draw.
    Visible { frame: Rect, border: i32 },
    Hidden,
}

impl Placement {
    pub fn frame(&self) -> Option<Rect> {
        match self {
            Placement::Visible { frame, .. } => Some(*frame),
            Placement::Hidden => None,
        }
    }
}

/// Output of one layout pass, in layout order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arrangement {
    pub placements: Vec<(WindowId, Placement)>,
}

impl Arrangement {
    pub fn get(&self, wid: WindowId) -> Option<Placement> {
        self.placements.iter().find(|(w, _)| *w == wid).map(|(_, p)| *p)
    }

    pub fn visible(&self) -> impl Iterator<Item = (WindowId, Rect)> + '_ {
        self.placements.iter().filter_map(|(w, p)| p.frame().map(|f| (*w, f)))
    }
}

/// Where a window sat in a layout before it was taken out.
///
/// A slot is only reused while the layout still has the shape it had right
/// after the window left; any other change invalidates it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Slot {
    /// Windows left behind, one list per column (a single list for flat
    /// layouts).
    pub remaining: Vec<Vec<WindowId>>,
    pub column: usize,
    pub index: usize,
    /// Weight of the window within its column or list.
    pub weight: f64,
    /// Set when the window had a column to itself, which went away with it.
    pub column_weight: Option<f64>,
    pub split: bool,
}

impl Slot {
    pub(crate) fn in_list(remaining: Vec<WindowId>, index: usize, weight: f64) -> Self {
        Self {
            remaining: vec![remaining],
            column: 0,
            index,
            weight,
            column_weight: None,
            split: true,
        }
    }

    pub(crate) fn fits_list(&self, windows: &[WindowId]) -> bool {
        matches!(self.remaining.as_slice(), [only] if only == windows)
    }
}

/// Per-pass inputs that are not owned by the layout.
#[derive(Clone, Copy)]
pub struct ArrangeContext<'a> {
    /// Current frames of the windows, used by layouts that do not tile.
    pub frames: &'a HashMap<WindowId, Rect>,
}

/// A layout algorithm together with its persistent state and tunables.
///
/// Instances only hold windows that are tiled in their group; floating and
/// minimized windows are kept out by the caller.
#[enum_dispatch]
pub trait Layout {
    fn name(&self) -> &str;

    /// Add after the focused window and focus it.
    fn add_window(&mut self, wid: WindowId);
    fn remove_window(&mut self, wid: WindowId) -> bool;
    /// Remove the window and describe the slot it leaves.
    fn detach(&mut self, wid: WindowId) -> Option<Slot>;
    /// Put a detached window back into its slot and focus it. Returns false,
    /// leaving the layout untouched, when the layout changed shape since.
    fn reattach(&mut self, wid: WindowId, slot: &Slot) -> bool;
    /// Windows in layout order (used for next/previous and tab order).
    fn windows(&self) -> Vec<WindowId>;
    fn focused(&self) -> Option<WindowId>;
    fn focus(&mut self, wid: WindowId) -> bool;

    fn arrange(&self, region: Rect, ctx: ArrangeContext<'_>) -> Arrangement;

    /// Focus the neighbour in `direction`; returns the newly focused window.
    fn focus_direction(&mut self, direction: Direction) -> Option<WindowId>;
    fn shuffle(&mut self, direction: Direction) -> bool;
    /// Returns false if the layout has nothing to grow in that direction or
    /// the result would violate a size constraint; state is unchanged then.
    fn grow(&mut self, direction: Direction, region: Rect) -> bool;
    fn normalize(&mut self);
    fn toggle_split(&mut self) -> bool { false }

    fn contains(&self, wid: WindowId) -> bool { self.windows().contains(&wid) }

    fn focus_next(&mut self) -> Option<WindowId> { self.cycle(true) }

    fn focus_previous(&mut self) -> Option<WindowId> { self.cycle(false) }

    fn cycle(&mut self, forward: bool) -> Option<WindowId> {
        let windows = self.windows();
        if windows.is_empty() {
            return None;
        }
        let len = windows.len();
        let cur = self.focused().and_then(|f| windows.iter().position(|w| *w == f)).unwrap_or(0);
        let next = if forward { (cur + 1) % len } else { (cur + len - 1) % len };
        let target = windows[next];
        self.focus(target);
        Some(target)
    }
}

#[enum_dispatch(Layout)]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum LayoutInstance {
    Columns,
    Max,
    VerticalTile,
    Floating,
}

impl LayoutInstance {
    pub fn from_spec(spec: &LayoutSpec) -> Self {
        match spec {
            LayoutSpec::Columns(s) => Columns::new(s.clone()).into(),
            LayoutSpec::Max(s) => Max::new(s.clone()).into(),
            LayoutSpec::VerticalTile(s) => VerticalTile::new(s.clone()).into(),
            LayoutSpec::Floating(s) => Floating::new(s.clone()).into(),
        }
    }

    pub fn is_floating(&self) -> bool { matches!(self, LayoutInstance::Floating(_)) }
}

#[cfg(test)]
pub(crate) fn no_frames() -> &'static HashMap<WindowId, Rect> {
    use std::sync::OnceLock;
    static EMPTY: OnceLock<HashMap<WindowId, Rect>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::default)
}
