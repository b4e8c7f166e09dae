use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::GroupId;
use crate::sys::geometry::{Rect, Size};

/// Opaque handle assigned by the compositor when a window is mapped.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self { Self(raw) }

    pub fn get(self) -> u64 { self.0 }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// What the compositor tells us about a window when it is mapped.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct WindowInfo {
    pub class: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub transient_for: Option<WindowId>,
    /// Geometry the client asked for.
    pub frame: Rect,
    pub wants_fullscreen: bool,
    /// The client minimizes itself when it loses focus (games, mostly).
    pub minimize_on_focus_loss: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaseState {
    Tiled,
    Floating,
}

/// Per-window management state.
///
/// Fullscreen and Minimized remember the state they were entered from so that
/// leaving them puts the window back where it was.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum WindowState {
    #[default]
    Normal,
    Floating,
    Fullscreen {
        prior: BaseState,
    },
    Minimized {
        prior: BaseState,
        fullscreen: bool,
    },
}

impl WindowState {
    fn from_base(base: BaseState) -> Self {
        match base {
            BaseState::Tiled => WindowState::Normal,
            BaseState::Floating => WindowState::Floating,
        }
    }

    fn base(self) -> BaseState {
        match self {
            WindowState::Normal => BaseState::Tiled,
            WindowState::Floating => BaseState::Floating,
            WindowState::Fullscreen { prior } | WindowState::Minimized { prior, .. } => prior,
        }
    }

    /// Laid out by the group's current layout.
    pub fn is_tiled(self) -> bool { self == WindowState::Normal }

    pub fn is_floating(self) -> bool { self == WindowState::Floating }

    pub fn is_fullscreen(self) -> bool { matches!(self, WindowState::Fullscreen { .. }) }

    pub fn is_minimized(self) -> bool { matches!(self, WindowState::Minimized { .. }) }

    /// Returns false when the transition does not apply (minimized windows).
    pub fn toggle_fullscreen(&mut self) -> bool {
        *self = match *self {
            WindowState::Normal => WindowState::Fullscreen { prior: BaseState::Tiled },
            WindowState::Floating => WindowState::Fullscreen { prior: BaseState::Floating },
            WindowState::Fullscreen { prior } => Self::from_base(prior),
            WindowState::Minimized { .. } => return false,
        };
        true
    }

    /// Only Normal and Floating toggle; fullscreen and minimized windows keep
    /// their state.
    pub fn toggle_floating(&mut self) -> bool {
        *self = match *self {
            WindowState::Normal => WindowState::Floating,
            WindowState::Floating => WindowState::Normal,
            _ => return false,
        };
        true
    }

    pub fn set_floating(&mut self, floating: bool) -> bool {
        if self.is_floating() != floating {
            self.toggle_floating()
        } else {
            false
        }
    }

    pub fn minimize(&mut self) -> bool {
        if self.is_minimized() {
            return false;
        }
        *self = WindowState::Minimized {
            prior: self.base(),
            fullscreen: self.is_fullscreen(),
        };
        true
    }

    pub fn restore(&mut self) -> bool {
        let WindowState::Minimized { prior, fullscreen } = *self else {
            return false;
        };
        *self = if fullscreen {
            WindowState::Fullscreen { prior }
        } else {
            Self::from_base(prior)
        };
        true
    }
}

/// A configure request the client answered with another size.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Refusal {
    pub requested: Size,
    pub got: Size,
    pub count: u32,
}

impl Refusal {
    /// Record one more answer of `got` to a request for `requested`.
    pub fn next(prev: Option<Refusal>, requested: Size, got: Size) -> Refusal {
        let count = match prev {
            Some(r) if r.requested == requested && r.got == got => r.count + 1,
            _ => 1,
        };
        Refusal { requested, got, count }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ManagedWindow {
    pub id: WindowId,
    pub class: Option<String>,
    pub title: Option<String>,
    pub role: Option<String>,
    pub transient_for: Option<WindowId>,
    /// Last geometry we know the window to have.
    pub frame: Rect,
    /// Geometry used while floating; kept across tile/float round trips.
    pub float_frame: Option<Rect>,
    pub state: WindowState,
    pub group: GroupId,
    pub stack_index: u64,
    pub urgent: bool,
    /// Size the client insisted on after refusing the same request
    /// repeatedly. Cleared when it takes the tile size or the window is
    /// rearranged.
    pub fixed_size: Option<Size>,
    pub refused: Option<Refusal>,
    pub minimize_on_focus_loss: bool,
}

impl ManagedWindow {
    pub fn new(id: WindowId, info: WindowInfo, group: GroupId) -> Self {
        Self {
            id,
            class: info.class,
            title: info.title,
            role: info.role,
            transient_for: info.transient_for,
            frame: info.frame,
            float_frame: None,
            state: WindowState::Normal,
            group,
            stack_index: 0,
            urgent: false,
            fixed_size: None,
            refused: None,
            minimize_on_focus_loss: info.minimize_on_focus_loss,
        }
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().or(self.class.as_deref()).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_restores_prior_state() {
        let mut state = WindowState::Floating;
        assert!(state.toggle_fullscreen());
        assert_eq!(state, WindowState::Fullscreen { prior: BaseState::Floating });
        assert!(state.toggle_fullscreen());
        assert_eq!(state, WindowState::Floating);

        let mut state = WindowState::Normal;
        state.toggle_fullscreen();
        state.toggle_fullscreen();
        assert_eq!(state, WindowState::Normal);
    }

    #[test]
    fn floating_toggle_ignores_fullscreen() {
        let mut state = WindowState::Fullscreen { prior: BaseState::Tiled };
        assert!(!state.toggle_floating());
        assert!(state.is_fullscreen());
    }

    #[test]
    fn refusals_count_only_identical_answers() {
        let (a, b) = (Size::new(600, 800), Size::new(500, 300));
        let first = Refusal::next(None, a, b);
        assert_eq!(first.count, 1);
        assert_eq!(Refusal::next(Some(first), a, b).count, 2);
        assert_eq!(Refusal::next(Some(first), Size::new(540, 800), b).count, 1);
    }

    #[test]
    fn minimize_round_trip_keeps_fullscreen() {
        let mut state = WindowState::Fullscreen { prior: BaseState::Tiled };
        assert!(state.minimize());
        assert!(!state.minimize());
        assert!(!state.toggle_fullscreen());
        assert!(state.restore());
        assert_eq!(state, WindowState::Fullscreen { prior: BaseState::Tiled });
        assert!(!state.restore());
    }
}
