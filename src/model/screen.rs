use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::GroupId;
use crate::sys::geometry::{Insets, Rect};

/// Output identifier as reported by the compositor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ScreenId(u32);

impl ScreenId {
    pub const fn new(raw: u32) -> Self { Self(raw) }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "screen{}", self.0) }
}

/// An output as announced by the compositor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenSpec {
    pub id: ScreenId,
    pub frame: Rect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screen {
    pub id: ScreenId,
    pub frame: Rect,
    /// Space held back for bars along each edge.
    pub reserved: Insets,
    pub group: Option<GroupId>,
}

impl Screen {
    pub fn new(spec: ScreenSpec, reserved: Insets) -> Self {
        Self {
            id: spec.id,
            frame: spec.frame,
            reserved,
            group: None,
        }
    }

    /// Region left for windows once bar reservations are taken out.
    pub fn usable(&self) -> Rect { self.frame.shrink(self.reserved) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usable_region_excludes_bar() {
        let spec = ScreenSpec {
            id: ScreenId::new(0),
            frame: Rect::new(0, 0, 1920, 1080),
        };
        let screen = Screen::new(spec, Insets { bottom: 24, ..Default::default() });
        assert_eq!(screen.usable(), Rect::new(0, 0, 1920, 1056));
    }
}
