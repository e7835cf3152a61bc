//! Coordinate transformation between a down-scaled preview surface and the
//! full-resolution source bitmap
//!
//! The preview is letterboxed into a bounding box with a single uniform
//! scale factor `s = source_width / display_width`; small images are never
//! upscaled (`s = 1`).

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::PixelError;
use crate::region::{Region, MIN_SELECTION_SIDE};

/// Maximum preview size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplayBounds {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 400,
        }
    }
}

/// Point on the preview surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

/// Point in source-bitmap pixel space (not yet rounded)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl SourcePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rectangle on the preview surface with non-negative extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    /// Normalize two drag corners so width and height are non-negative
    /// regardless of drag direction
    pub fn from_corners(a: DisplayPoint, b: DisplayPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// Whether this rectangle counts as a selection; anything thinner than
    /// two display pixels is "no selection"
    pub fn is_selection(&self) -> bool {
        let min = MIN_SELECTION_SIDE as f64;
        self.width >= min && self.height >= min
    }
}

/// Scale mapping between a preview surface and the bitmap it shows.
///
/// Bound to the dimensions of the bitmap it was computed for; mapping onto a
/// different bitmap is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    source_width: u32,
    source_height: u32,
    display_width: u32,
    display_height: u32,
    scale: f64,
}

impl DisplayTransform {
    /// Fit a `source_width x source_height` image into `bounds`
    pub fn fit(source_width: u32, source_height: u32, bounds: DisplayBounds) -> Self {
        let (sw, sh) = (source_width as f64, source_height as f64);
        let exceeds = source_width > bounds.max_width || source_height > bounds.max_height;

        if !exceeds || source_width == 0 || source_height == 0 {
            return Self {
                source_width,
                source_height,
                display_width: source_width,
                display_height: source_height,
                scale: 1.0,
            };
        }

        let ratio = (bounds.max_width as f64 / sw).min(bounds.max_height as f64 / sh);
        let display_width = ((sw * ratio).round() as u32).max(1);
        let display_height = ((sh * ratio).round() as u32).max(1);

        Self {
            source_width,
            source_height,
            display_width,
            display_height,
            scale: sw / display_width as f64,
        }
    }

    pub fn for_bitmap(bitmap: &Bitmap, bounds: DisplayBounds) -> Self {
        Self::fit(bitmap.width(), bitmap.height(), bounds)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    pub fn to_source(&self, p: DisplayPoint) -> SourcePoint {
        SourcePoint {
            x: p.x * self.scale,
            y: p.y * self.scale,
        }
    }

    pub fn to_display(&self, p: SourcePoint) -> DisplayPoint {
        DisplayPoint {
            x: p.x / self.scale,
            y: p.y / self.scale,
        }
    }

    /// Reject use of this transform against a bitmap it was not computed for
    pub fn check_bitmap(&self, bitmap: &Bitmap) -> Result<(), PixelError> {
        if bitmap.dimensions() != (self.source_width, self.source_height) {
            return Err(PixelError::InvalidParameter(format!(
                "Display transform was computed for a {}x{} image, not {}x{}",
                self.source_width,
                self.source_height,
                bitmap.width(),
                bitmap.height()
            )));
        }
        Ok(())
    }

    /// Map a display rectangle to a pixel region of `bitmap`.
    ///
    /// Each component is scaled then rounded to nearest, and the result is
    /// clamped to the bitmap bounds.
    pub fn region_for(&self, bitmap: &Bitmap, rect: DisplayRect) -> Result<Region, PixelError> {
        self.check_bitmap(bitmap)?;
        let to_px = |v: f64| (v * self.scale).round().max(0.0) as u32;
        let region = Region::new(
            to_px(rect.x),
            to_px(rect.y),
            to_px(rect.width),
            to_px(rect.height),
        );
        Ok(region.clamp_to(bitmap.width(), bitmap.height()))
    }
}

/// Pointer drag on the preview surface.
///
/// `press` starts a drag, `drag` updates the live rectangle, `release` ends
/// it while keeping the last rectangle as the current selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionGesture {
    anchor: Option<DisplayPoint>,
    rect: Option<DisplayRect>,
}

impl SelectionGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, at: DisplayPoint) {
        self.anchor = Some(at);
        self.rect = Some(DisplayRect::from_corners(at, at));
    }

    /// Returns the updated rectangle, or `None` when no drag is active
    pub fn drag(&mut self, to: DisplayPoint) -> Option<DisplayRect> {
        let anchor = self.anchor?;
        let rect = DisplayRect::from_corners(anchor, to);
        self.rect = Some(rect);
        Some(rect)
    }

    pub fn release(&mut self) {
        self.anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// The current rectangle if it is large enough to act on
    pub fn selection(&self) -> Option<DisplayRect> {
        self.rect.filter(DisplayRect::is_selection)
    }

    /// Forget the selection, e.g. when a new image is loaded
    pub fn clear(&mut self) {
        self.anchor = None;
        self.rect = None;
    }
}
