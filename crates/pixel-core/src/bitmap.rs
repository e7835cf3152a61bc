//! Owned RGBA8 pixel buffer

use crate::error::PixelError;

pub const CHANNELS: usize = 4;

/// Row-major RGBA bitmap, 8 bits per channel.
///
/// Bitmaps are plain owned values: transforms read one and produce another,
/// nothing draws into a shared surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap an existing RGBA buffer; its length must be `width * height * 4`
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PixelError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                PixelError::InvalidParameter(format!("Bitmap {}x{} is too large", width, height))
            })?;

        if pixels.len() != expected {
            return Err(PixelError::InvalidParameter(format!(
                "Pixel buffer has {} bytes, expected {} for {}x{}",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A bitmap where every pixel has the same color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * CHANNELS);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Pixel at `(x, y)`, or `None` outside the bitmap
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Pixel lookup with edge extension: coordinates past an edge read the
    /// nearest edge pixel. Must not be called on an empty bitmap.
    pub(crate) fn clamped_pixel(&self, x: i64, y: i64) -> [u8; 4] {
        let cx = x.clamp(0, self.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.height as i64 - 1) as u32;
        let i = self.offset(cx, cy);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub(crate) fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.offset(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Builder-style pixel write, mostly useful for constructing fixtures
    pub fn with_pixel(mut self, x: u32, y: u32, rgba: [u8; 4]) -> Self {
        self.put_pixel(x, y, rgba);
        self
    }
}
