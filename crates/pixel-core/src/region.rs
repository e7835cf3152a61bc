//! Rectangular pixel regions in source-bitmap coordinates

use serde::{Deserialize, Serialize};

/// Smallest side length, in either axis, of a selection worth acting on
pub const MIN_SELECTION_SIDE: u32 = 2;

/// Rectangle in source-bitmap pixel units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// The empty region used for "whole-frame" batch items, which fill as a no-op
    pub const EMPTY: Region = Region {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the region is large enough to count as a selection
    pub fn is_actionable(&self) -> bool {
        self.width >= MIN_SELECTION_SIDE && self.height >= MIN_SELECTION_SIDE
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64 && x < self.right() as i64 && y >= self.y as i64 && y < self.bottom() as i64
    }

    /// Intersect with `[0, width) x [0, height)`.
    ///
    /// A region lying entirely outside the bounds collapses to a zero-size
    /// region anchored at the clipped origin.
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Region {
            x,
            y,
            width: self.right().min(width) - x,
            height: self.bottom().min(height) - y,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
