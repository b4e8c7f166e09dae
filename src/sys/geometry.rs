//! Integer rectangle arithmetic shared by every layout.
//!
//! All operations are pure and never produce a negative width or height;
//! anything that would go below zero is clamped to zero instead.

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self { Self { width, height } }
}

/// Space reserved on each edge of a region (bar struts, margins, borders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Insets {
    pub const fn uniform(v: i32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.right == 0 && self.bottom == 0 && self.left == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    pub fn from_parts(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point { Point::new(self.x, self.y) }

    pub fn size(&self) -> Size { Size::new(self.width, self.height) }

    pub fn max_x(&self) -> i32 { self.x + self.width }

    pub fn max_y(&self) -> i32 { self.y + self.height }

    pub fn center(&self) -> Point { Point::new(self.x + self.width / 2, self.y + self.height / 2) }

    pub fn area(&self) -> i64 { i64::from(self.width) * i64::from(self.height) }

    pub fn is_empty(&self) -> bool { self.width == 0 || self.height == 0 }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.max_x() && p.y >= self.y && p.y < self.max_y()
    }

    pub fn len_along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    /// Overlapping region of two rectangles, `None` when they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x <= x || max_y <= y {
            return None;
        }
        Some(Rect::new(x, y, max_x - x, max_y - y))
    }

    /// Subtract a margin from every edge. Collapses to zero size rather than
    /// going negative; the origin stays inside the original rectangle.
    pub fn shrink(&self, insets: Insets) -> Rect {
        if insets.is_zero() {
            return *self;
        }
        let width = (self.width - insets.left - insets.right).max(0);
        let height = (self.height - insets.top - insets.bottom).max(0);
        let x = (self.x + insets.left).min(self.max_x());
        let y = (self.y + insets.top).min(self.max_y());
        Rect::new(x, y, width, height)
    }

    /// Split into two parts along `orientation`; the first part receives
    /// `ratio` of the length. The ratio is clamped to `[0, 1]`.
    pub fn split(&self, ratio: f64, orientation: Orientation) -> (Rect, Rect) {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.5 };
        match orientation {
            Orientation::Horizontal => {
                let first = (f64::from(self.width) * ratio).round() as i32;
                (
                    Rect::new(self.x, self.y, first, self.height),
                    Rect::new(self.x + first, self.y, self.width - first, self.height),
                )
            }
            Orientation::Vertical => {
                let first = (f64::from(self.height) * ratio).round() as i32;
                (
                    Rect::new(self.x, self.y, self.width, first),
                    Rect::new(self.x, self.y + first, self.width, self.height - first),
                )
            }
        }
    }

    /// Move (and if needed shrink) the rectangle so it lies inside `bounds`.
    pub fn clamp_to(&self, bounds: &Rect) -> Rect {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let x = self.x.clamp(bounds.x, bounds.max_x() - width);
        let y = self.y.clamp(bounds.y, bounds.max_y() - height);
        Rect::new(x, y, width, height)
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn with_size(&self, size: Size) -> Rect { Rect::new(self.x, self.y, size.width, size.height) }
}

/// Distribute the length of `rect` along `orientation` over `weights`.
///
/// The returned spans always cover the usable length exactly: `gap` pixels
/// sit between neighbours and the final span absorbs rounding error. Weights
/// that are not positive and finite are treated as equal shares.
pub fn split_weighted(rect: Rect, weights: &[f64], orientation: Orientation, gap: i32) -> Vec<Rect> {
    if weights.is_empty() {
        return Vec::new();
    }
    let gap = gap.max(0);
    let total_gap = gap * (weights.len() as i32 - 1);
    let usable = (rect.len_along(orientation) - total_gap).max(0);

    let sane = weights.iter().all(|w| w.is_finite() && *w > 0.0);
    let total: f64 = if sane { weights.iter().sum() } else { weights.len() as f64 };

    let mut out = Vec::with_capacity(weights.len());
    let mut offset = match orientation {
        Orientation::Horizontal => rect.x,
        Orientation::Vertical => rect.y,
    };
    let mut consumed = 0;
    for (i, weight) in weights.iter().enumerate() {
        let weight = if sane { *weight } else { 1.0 };
        let len = if i + 1 == weights.len() {
            usable - consumed
        } else {
            ((f64::from(usable) * weight / total).round() as i32).min(usable - consumed)
        };
        let part = match orientation {
            Orientation::Horizontal => Rect::new(offset, rect.y, len, rect.height),
            Orientation::Vertical => Rect::new(rect.x, offset, rect.width, len),
        };
        out.push(part);
        consumed += len;
        offset += len + gap;
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn intersect_overlapping_and_disjoint() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersect(&b), Some(Rect::new(50, 50, 50, 50)));
        assert_eq!(a.intersect(&Rect::new(100, 0, 10, 10)), None);
    }

    #[test]
    fn shrink_never_goes_negative() {
        let r = Rect::new(10, 10, 20, 20);
        let shrunk = r.shrink(Insets::uniform(15));
        assert_eq!(shrunk.width, 0);
        assert_eq!(shrunk.height, 0);
        assert!(shrunk.x <= r.max_x());
    }

    #[test]
    fn split_halves() {
        let (a, b) = Rect::new(0, 0, 101, 50).split(0.5, Orientation::Horizontal);
        assert_eq!(a.width + b.width, 101);
        assert_eq!(b.x, a.max_x());
        let (top, bottom) = Rect::new(0, 0, 10, 80).split(0.25, Orientation::Vertical);
        assert_eq!((top.height, bottom.height), (20, 60));
    }

    #[test]
    fn clamp_to_moves_window_back_on_screen() {
        let screen = Rect::new(0, 0, 1000, 800);
        let clamped = Rect::new(900, -40, 300, 200).clamp_to(&screen);
        assert_eq!(clamped, Rect::new(700, 0, 300, 200));
        let oversized = Rect::new(-10, -10, 2000, 2000).clamp_to(&screen);
        assert_eq!(oversized, screen);
    }

    #[test]
    fn weighted_split_covers_region_exactly() {
        let region = Rect::new(0, 0, 1000, 10);
        for n in 1..=9 {
            let spans = split_weighted(region, &vec![1.0; n], Orientation::Horizontal, 0);
            let total: i32 = spans.iter().map(|r| r.width).sum();
            assert_eq!(total, 1000, "n = {n}");
            assert_eq!(spans.last().unwrap().max_x(), 1000);
        }
    }

    #[test]
    fn weighted_split_with_gaps() {
        let spans = split_weighted(Rect::new(0, 0, 100, 10), &[1.0, 1.0], Orientation::Horizontal, 10);
        assert_eq!(spans[0], Rect::new(0, 0, 45, 10));
        assert_eq!(spans[1], Rect::new(55, 0, 45, 10));
    }

    #[test]
    fn weighted_split_treats_bad_weights_as_equal() {
        let spans =
            split_weighted(Rect::new(0, 0, 90, 30), &[0.0, f64::NAN, 1.0], Orientation::Vertical, 0);
        assert_eq!(spans.iter().map(|r| r.height).collect::<Vec<_>>(), vec![30, 30, 30]);
    }
}
