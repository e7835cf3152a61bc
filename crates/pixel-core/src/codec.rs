//! Image bytes <-> Bitmap

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use serde::{Deserialize, Serialize};
use shared_types::FormatKind;
use tracing::debug;

use crate::bitmap::Bitmap;
use crate::error::PixelError;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// 1-100, only used for JPEG output
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Decoded image together with the container format it came from
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bitmap: Bitmap,
    pub format: FormatKind,
}

/// Sniff the image container from its magic bytes
pub fn sniff_format(bytes: &[u8]) -> Result<FormatKind, PixelError> {
    let format = image::guess_format(bytes)
        .map_err(|e| PixelError::Decode(format!("Unrecognized image data: {}", e)))?;
    match format {
        ImageFormat::Png => Ok(FormatKind::Png),
        ImageFormat::Jpeg => Ok(FormatKind::Jpeg),
        ImageFormat::WebP => Ok(FormatKind::Webp),
        other => Err(PixelError::UnsupportedFormat(format!("{:?}", other))),
    }
}

/// Decode PNG, JPEG or WebP bytes into an RGBA bitmap
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, PixelError> {
    let format = sniff_format(bytes)?;
    let image = image::load_from_memory(bytes).map_err(|e| PixelError::Decode(e.to_string()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let bitmap = Bitmap::from_rgba(width, height, rgba.into_raw())?;

    debug!(width, height, ?format, "Decoded image");
    Ok(DecodedImage { bitmap, format })
}

/// Encode a bitmap in the requested image format.
///
/// JPEG has no alpha channel, so alpha is dropped for JPEG output.
pub fn encode(
    bitmap: &Bitmap,
    format: FormatKind,
    options: &EncodeOptions,
) -> Result<Vec<u8>, PixelError> {
    let (width, height) = bitmap.dimensions();
    let mut out = Vec::new();

    match format {
        FormatKind::Png => PngEncoder::new(&mut out)
            .write_image(bitmap.as_rgba(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| PixelError::Encode(e.to_string()))?,
        FormatKind::Jpeg => {
            let rgb = rgba_to_rgb(bitmap.as_rgba());
            let quality = options.jpeg_quality.clamp(1, 100);
            JpegEncoder::new_with_quality(&mut out, quality)
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| PixelError::Encode(e.to_string()))?
        }
        FormatKind::Webp => WebPEncoder::new_lossless(&mut out)
            .write_image(bitmap.as_rgba(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| PixelError::Encode(e.to_string()))?,
        other => {
            return Err(PixelError::UnsupportedFormat(format!(
                "{:?} is not an image output format",
                other
            )))
        }
    }

    debug!(width, height, ?format, bytes = out.len(), "Encoded image");
    Ok(out)
}

pub(crate) fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> Bitmap {
        let mut bmp = Bitmap::filled(width, height, [255, 255, 255, 255]);
        for y in 0..height {
            for x in 0..width {
                if (x + y) % 2 == 0 {
                    bmp = bmp.with_pixel(x, y, [10, 20, 30, 200]);
                }
            }
        }
        bmp
    }

    #[test]
    fn test_png_is_lossless() {
        let bmp = checkerboard(7, 5);
        let bytes = encode(&bmp, FormatKind::Png, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.format, FormatKind::Png);
        assert_eq!(decoded.bitmap, bmp);
    }

    #[test]
    fn test_webp_lossless_keeps_alpha() {
        let bmp = checkerboard(4, 4);
        let bytes = encode(&bmp, FormatKind::Webp, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.format, FormatKind::Webp);
        assert_eq!(decoded.bitmap, bmp);
    }

    #[test]
    fn test_jpeg_output_is_opaque() {
        let bmp = Bitmap::filled(16, 16, [120, 60, 30, 10]);
        let bytes = encode(&bmp, FormatKind::Jpeg, &EncodeOptions::default()).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.format, FormatKind::Jpeg);
        assert_eq!(decoded.bitmap.dimensions(), (16, 16));
        assert_eq!(decoded.bitmap.pixel(8, 8).unwrap()[3], 255);
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PixelError::Decode(_)));
    }

    #[test]
    fn test_truncated_png_fails_to_decode() {
        let bytes = encode(&checkerboard(8, 8), FormatKind::Png, &EncodeOptions::default()).unwrap();
        let err = decode(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, PixelError::Decode(_)));
    }

    #[test]
    fn test_pdf_is_not_an_image_output() {
        let bmp = Bitmap::filled(1, 1, [0, 0, 0, 255]);
        let err = encode(&bmp, FormatKind::Pdf, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, PixelError::UnsupportedFormat(_)));
    }
}
