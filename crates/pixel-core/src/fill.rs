//! Local region fill ("watermark removal")
//!
//! Every pixel inside the target region is replaced by the rounded average of
//! the pixels in its `(2r+1)^2` neighborhood that lie outside the region.
//! Neighborhood coordinates past the bitmap edge read the nearest edge pixel.
//! This is a blur-fill, not content-aware inpainting: large regions come out
//! visibly soft.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitmap::Bitmap;
use crate::region::Region;

pub const DEFAULT_RADIUS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOptions {
    /// Neighborhood radius in pixels
    #[serde(default = "default_radius")]
    pub radius: u32,
}

fn default_radius() -> u32 {
    DEFAULT_RADIUS
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
        }
    }
}

/// Fill `region` with the default radius
pub fn fill(bitmap: &Bitmap, region: Region) -> Bitmap {
    fill_with(bitmap, region, &FillOptions::default())
}

/// Fill `region` of `bitmap`, returning a new bitmap.
///
/// Pixels outside the (clamped) region are copied unchanged. A region that
/// is empty after clamping to the bitmap yields an unmodified copy.
pub fn fill_with(bitmap: &Bitmap, region: Region, options: &FillOptions) -> Bitmap {
    let mut out = bitmap.clone();
    let target = region.clamp_to(bitmap.width(), bitmap.height());
    if target.is_empty() {
        debug!(?region, "Fill region is empty after clamping, nothing to do");
        return out;
    }

    let r = options.radius as i64;
    for py in target.y..target.bottom() {
        for px in target.x..target.right() {
            let mut acc = Accumulator::default();
            for dy in -r..=r {
                for dx in -r..=r {
                    let sx = px as i64 + dx;
                    let sy = py as i64 + dy;
                    if target.contains(sx, sy) {
                        continue;
                    }
                    acc.add(bitmap.clamped_pixel(sx, sy));
                }
            }

            if acc.count == 0 {
                // Neighborhood lies wholly inside the region: project to the
                // nearest outside pixel in each of the four directions.
                let (x, y) = (px as i64, py as i64);
                acc.add(bitmap.clamped_pixel(target.x as i64 - 1, y));
                acc.add(bitmap.clamped_pixel(target.right() as i64, y));
                acc.add(bitmap.clamped_pixel(x, target.y as i64 - 1));
                acc.add(bitmap.clamped_pixel(x, target.bottom() as i64));
            }

            out.put_pixel(px, py, acc.average());
        }
    }

    debug!(
        x = target.x,
        y = target.y,
        width = target.width,
        height = target.height,
        radius = options.radius,
        "Filled region"
    );
    out
}

#[derive(Default)]
struct Accumulator {
    sums: [u64; 4],
    count: u64,
}

impl Accumulator {
    fn add(&mut self, rgba: [u8; 4]) {
        for (sum, channel) in self.sums.iter_mut().zip(rgba) {
            *sum += channel as u64;
        }
        self.count += 1;
    }

    /// Per-channel mean, rounded half up
    fn average(&self) -> [u8; 4] {
        let n = self.count.max(1);
        let mut out = [0u8; 4];
        for (slot, sum) in out.iter_mut().zip(self.sums) {
            *slot = ((sum + n / 2) / n) as u8;
        }
        out
    }
}
