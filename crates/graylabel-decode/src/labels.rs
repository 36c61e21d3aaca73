use std::collections::BTreeMap;

use graylabel_core::PixelCoord;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Two positions decoded to the same index. `kept` replaced `replaced`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCollision {
    pub index: u64,
    pub replaced: PixelCoord,
    pub kept: PixelCoord,
}

/// Decoded index to pixel position, ordered by index.
///
/// Inserting an index twice keeps the later position; every such overwrite
/// is remembered in [`LabelMap::collisions`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<u64, PixelCoord>,
    collisions: Vec<LabelCollision>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u64, coord: PixelCoord) {
        if let Some(replaced) = self.entries.insert(index, coord) {
            warn!("index {index} decoded at {replaced} and {coord}; keeping {coord}");
            self.collisions.push(LabelCollision {
                index,
                replaced,
                kept: coord,
            });
        }
    }

    pub fn get(&self, index: u64) -> Option<PixelCoord> {
        self.entries.get(&index).copied()
    }

    /// Number of distinct indices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, PixelCoord)> + '_ {
        self.entries.iter().map(|(&i, &c)| (i, c))
    }

    pub fn collisions(&self) -> &[LabelCollision] {
        &self.collisions
    }

    /// Positions ordered by index.
    ///
    /// Fails unless exactly `total_pixels` distinct indices were decoded.
    pub fn into_positions(self, total_pixels: usize) -> Result<Vec<PixelCoord>, DecodeError> {
        if self.entries.len() != total_pixels {
            return Err(DecodeError::LabelCardinality {
                expected: total_pixels,
                got: self.entries.len(),
            });
        }
        Ok(self.entries.into_values().collect())
    }
}

impl FromIterator<(u64, PixelCoord)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (u64, PixelCoord)>>(iter: T) -> Self {
        let mut map = LabelMap::new();
        for (index, coord) in iter {
            map.insert(index, coord);
        }
        map
    }
}
