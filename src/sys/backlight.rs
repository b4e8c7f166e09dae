//! Brightness control through a sysfs backlight directory
//! (`/sys/class/backlight/<device>`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Backlight {
    dir: PathBuf,
}

impl Backlight {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    fn read_value(&self, name: &str) -> io::Result<u64> {
        let raw = fs::read_to_string(self.dir.join(name))?;
        raw.trim()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{name}: {e}")))
    }

    pub fn brightness(&self) -> io::Result<u64> { self.read_value("brightness") }

    pub fn max_brightness(&self) -> io::Result<u64> { self.read_value("max_brightness") }

    /// Step the brightness up or down, clamped to `[0, max_brightness]`.
    /// Returns the value written.
    pub fn adjust(&self, step: u32, increase: bool) -> io::Result<u64> {
        let current = self.brightness()?;
        let max = self.max_brightness()?;
        let target = if increase {
            current.saturating_add(u64::from(step)).min(max)
        } else {
            current.saturating_sub(u64::from(step))
        };
        fs::write(self.dir.join("brightness"), target.to_string())?;
        Ok(target)
    }
}
