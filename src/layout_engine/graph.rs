use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Right and Down walk towards higher indices.
    pub fn is_forward(self) -> bool { matches!(self, Direction::Right | Direction::Down) }

    /// Index of the neighbour of `idx` in this direction within `0..len`.
    pub fn step(self, idx: usize, len: usize) -> Option<usize> {
        if self.is_forward() {
            (idx + 1 < len).then_some(idx + 1)
        } else {
            idx.checked_sub(1)
        }
    }
}
