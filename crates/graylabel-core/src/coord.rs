use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer pixel position inside a frame grid.
///
/// Serialized as a two-element array `[x, y]` so coordinate lists stay
/// compact in job records and reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct PixelCoord {
    pub x: u32,
    pub y: u32,
}

impl PixelCoord {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another coordinate.
    #[inline]
    pub fn distance_sq(&self, other: &PixelCoord) -> u64 {
        let dx = self.x.abs_diff(other.x) as u64;
        let dy = self.y.abs_diff(other.y) as u64;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(&self, other: &PixelCoord) -> f32 {
        (self.distance_sq(other) as f32).sqrt()
    }

    /// Whether the coordinate lies inside a `width` x `height` grid.
    #[inline]
    pub fn is_within(&self, width: usize, height: usize) -> bool {
        (self.x as usize) < width && (self.y as usize) < height
    }
}

impl From<(u32, u32)> for PixelCoord {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl From<PixelCoord> for (u32, u32) {
    fn from(c: PixelCoord) -> Self {
        (c.x, c.y)
    }
}

impl fmt::Display for PixelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
