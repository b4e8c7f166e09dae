use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;
use crate::model::WindowId;
use crate::sys::geometry::{Rect, split_weighted};

pub(crate) const DEFAULT_WEIGHT: f64 = 100.0;

/// Ordered windows with a focus cursor. Shared by every layout that keeps
/// a flat list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub(crate) struct WindowStack {
    pub(crate) windows: Vec<WindowId>,
    pub(crate) focused: usize,
}

impl WindowStack {
    pub(crate) fn len(&self) -> usize { self.windows.len() }

    pub(crate) fn is_empty(&self) -> bool { self.windows.is_empty() }

    pub(crate) fn focused(&self) -> Option<WindowId> { self.windows.get(self.focused).copied() }

    pub(crate) fn position(&self, wid: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| *w == wid)
    }

    /// Insert right after the focused window and focus the new one.
    pub(crate) fn insert_after_focus(&mut self, wid: WindowId) -> usize {
        let at = if self.windows.is_empty() { 0 } else { self.focused + 1 };
        self.windows.insert(at, wid);
        self.focused = at;
        at
    }

    /// Insert at `at` (clamped to the end) and focus the new window.
    pub(crate) fn insert_at(&mut self, at: usize, wid: WindowId) -> usize {
        let at = at.min(self.windows.len());
        self.windows.insert(at, wid);
        self.focused = at;
        at
    }

    pub(crate) fn remove(&mut self, wid: WindowId) -> Option<usize> {
        let idx = self.position(wid)?;
        self.windows.remove(idx);
        if self.focused > idx || self.focused >= self.windows.len() {
            self.focused = self.focused.saturating_sub(1);
        }
        Some(idx)
    }

    pub(crate) fn focus(&mut self, wid: WindowId) -> bool {
        match self.position(wid) {
            Some(idx) => {
                self.focused = idx;
                true
            }
            None => false,
        }
    }

    /// Swap the focused window with its neighbour; focus follows the window.
    pub(crate) fn swap_focused(&mut self, forward: bool) -> bool {
        let Some(other) = step(self.focused, self.windows.len(), forward) else {
            return false;
        };
        self.windows.swap(self.focused, other);
        self.focused = other;
        true
    }
}

pub(crate) fn step(idx: usize, len: usize, forward: bool) -> Option<usize> {
    if forward {
        (idx + 1 < len).then_some(idx + 1)
    } else {
        idx.checked_sub(1)
    }
}

/// Move `amount` of weight towards `weights[idx]` from its neighbour in the
/// given direction. At the edge, the focused entry shrinks and its inner
/// neighbour grows instead.
///
/// Nothing changes (and false is returned) when the donor would drop to or
/// below `amount`, or when any resulting span along `region` would be
/// smaller than `min_len` pixels.
pub(crate) fn grow_weights(
    weights: &mut [f64],
    idx: usize,
    forward: bool,
    amount: f64,
    region: Rect,
    orientation: Orientation,
    min_len: i32,
) -> bool {
    if idx >= weights.len() || weights.len() < 2 {
        return false;
    }
    let (donor, recipient) = match step(idx, weights.len(), forward) {
        Some(neighbour) => (neighbour, idx),
        None => match step(idx, weights.len(), !forward) {
            Some(inner) => (idx, inner),
            None => return false,
        },
    };
    if weights[donor] <= amount {
        return false;
    }
    let mut proposed = weights.to_vec();
    proposed[donor] -= amount;
    proposed[recipient] += amount;
    let spans = split_weighted(region, &proposed, orientation, 0);
    if spans.iter().any(|r| r.len_along(orientation) < min_len) {
        return false;
    }
    weights.copy_from_slice(&proposed);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<WindowId> { (1..=n).map(WindowId::new).collect() }

    #[test]
    fn remove_keeps_focus_on_a_neighbour() {
        let mut stack = WindowStack { windows: ids(3), focused: 2 };
        stack.remove(WindowId::new(3));
        assert_eq!(stack.focused(), Some(WindowId::new(2)));
        stack.remove(WindowId::new(1));
        assert_eq!(stack.focused(), Some(WindowId::new(2)));
        stack.remove(WindowId::new(2));
        assert_eq!(stack.focused(), None);
    }

    #[test]
    fn grow_moves_weight_between_neighbours() {
        let region = Rect::new(0, 0, 1200, 800);
        let mut w = vec![100.0; 3];
        assert!(grow_weights(&mut w, 1, false, 10.0, region, Orientation::Horizontal, 50));
        assert_eq!(w, vec![90.0, 110.0, 100.0]);
    }

    #[test]
    fn grow_at_edge_shrinks_focused() {
        let region = Rect::new(0, 0, 1200, 800);
        let mut w = vec![100.0, 100.0];
        assert!(grow_weights(&mut w, 0, false, 10.0, region, Orientation::Horizontal, 50));
        assert_eq!(w, vec![90.0, 110.0]);
    }

    #[test]
    fn grow_rejected_below_minimum() {
        let region = Rect::new(0, 0, 200, 800);
        let mut w = vec![100.0, 100.0];
        assert!(!grow_weights(&mut w, 0, true, 50.0, region, Orientation::Horizontal, 60));
        assert_eq!(w, vec![100.0, 100.0]);
        let mut single = vec![100.0];
        assert!(!grow_weights(&mut single, 0, true, 10.0, region, Orientation::Horizontal, 1));
    }
}
