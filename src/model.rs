pub mod group;
pub mod registry;
pub mod rules;
pub mod screen;
pub mod snapshot;
pub mod window;

pub use group::{GroupId, GroupManager};
pub use registry::{WindowAttr, WindowRegistry};
pub use screen::{Screen, ScreenId, ScreenSpec};
pub use snapshot::Snapshot;
pub use window::{ManagedWindow, Refusal, WindowId, WindowInfo, WindowState};
