//! Geometry, input triggers and the small pieces of OS plumbing the window
//! manager needs.

pub mod backlight;
pub mod geometry;
pub mod hotkey;
pub mod process;
