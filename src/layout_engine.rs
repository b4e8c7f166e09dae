//! Layout algorithms and the per-group layout lists.

mod graph;
mod group_layouts;
pub mod systems;
pub(crate) mod utils;

pub use graph::{Direction, Orientation};
pub use group_layouts::{GroupLayouts, LayoutSet};
pub use systems::{
    ArrangeContext, Arrangement, Columns, Floating, Layout, LayoutInstance, Max, Placement,
    Slot, VerticalTile,
};
