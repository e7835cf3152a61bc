//! Build a PDF with one full-page image per input

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use pixel_core::{codec::sniff_format, Bitmap};
use shared_types::{FormatKind, InputFile};
use tracing::{debug, info, warn};

use crate::error::PdfKitError;
use crate::page_tree;

const IMAGE_RESOURCE: &str = "Im0";

/// Result of [`images_to_pdf`]
#[derive(Debug, Clone)]
pub struct ImagesPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Names of inputs that were not images
    pub skipped: Vec<String>,
}

/// Image data ready to become an XObject
struct EmbeddedImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

/// Add each PNG, JPEG or WebP input as a page sized to the image in points
///
/// Inputs that are not images are skipped and listed in the result. An image
/// that fails to decode fails the whole call.
pub fn images_to_pdf(files: &[InputFile]) -> Result<ImagesPdf, PdfKitError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let mut page_ids = Vec::new();
    let mut skipped = Vec::new();

    for file in files {
        match file.format() {
            Ok(format) if format.is_image() => {}
            Ok(_) | Err(_) => {
                debug!(name = %file.name, "not an image, skipping");
                skipped.push(file.name.clone());
                continue;
            }
        }

        let image = prepare_image(&file.bytes)
            .map_err(|e| PdfKitError::Image(format!("{}: {}", file.name, e)))?;
        page_ids.push(add_image_page(&mut doc, pages_id, image)?);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
            "Count" => Object::Integer(page_ids.len() as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    if !skipped.is_empty() {
        warn!(count = skipped.len(), "skipped non-image inputs");
    }
    let bytes = page_tree::save(&mut doc)?;
    info!(pages = page_ids.len(), bytes = bytes.len(), "images to pdf complete");
    Ok(ImagesPdf {
        bytes,
        page_count: page_ids.len(),
        skipped,
    })
}

fn prepare_image(bytes: &[u8]) -> Result<EmbeddedImage, PdfKitError> {
    if sniff_format(bytes)? == FormatKind::Jpeg {
        if let Some(image) = passthrough_jpeg(bytes)? {
            return Ok(image);
        }
    }
    let decoded = pixel_core::decode(bytes)?;
    flate_image(&decoded.bitmap)
}

/// RGB and grayscale JPEGs are embedded as-is; anything else is re-encoded
fn passthrough_jpeg(bytes: &[u8]) -> Result<Option<EmbeddedImage>, PdfKitError> {
    let decoder =
        JpegDecoder::new(Cursor::new(bytes)).map_err(|e| PdfKitError::Image(e.to_string()))?;
    let color_space = match decoder.original_color_type() {
        ExtendedColorType::Rgb8 => "DeviceRGB",
        ExtendedColorType::L8 => "DeviceGray",
        other => {
            debug!(?other, "JPEG colour type needs re-encoding");
            return Ok(None);
        }
    };
    let (width, height) = decoder.dimensions();
    Ok(Some(EmbeddedImage {
        width,
        height,
        color_space,
        filter: "DCTDecode",
        data: bytes.to_vec(),
        alpha: None,
    }))
}

fn flate_image(bitmap: &Bitmap) -> Result<EmbeddedImage, PdfKitError> {
    let pixels = bitmap.as_rgba();
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for px in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let opaque = alpha.iter().all(|&a| a == u8::MAX);

    Ok(EmbeddedImage {
        width: bitmap.width(),
        height: bitmap.height(),
        color_space: "DeviceRGB",
        filter: "FlateDecode",
        data: deflate(&rgb)?,
        alpha: if opaque { None } else { Some(deflate(&alpha)?) },
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfKitError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfKitError::Image(e.to_string()))?;
    encoder.finish().map_err(|e| PdfKitError::Image(e.to_string()))
}

fn image_xobject(width: u32, height: u32, color_space: &str, filter: &str) -> Dictionary {
    dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => Object::Integer(width as i64),
        "Height" => Object::Integer(height as i64),
        "ColorSpace" => Object::Name(color_space.as_bytes().to_vec()),
        "BitsPerComponent" => Object::Integer(8),
        "Filter" => Object::Name(filter.as_bytes().to_vec()),
    }
}

fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: EmbeddedImage,
) -> Result<ObjectId, PdfKitError> {
    let (width, height) = (image.width, image.height);

    let mut xobject = image_xobject(width, height, image.color_space, image.filter);
    if let Some(alpha) = image.alpha {
        let mask = Stream::new(image_xobject(width, height, "DeviceGray", "FlateDecode"), alpha);
        xobject.set("SMask", Object::Reference(doc.add_object(mask)));
    }
    let image_id = doc.add_object(Stream::new(xobject, image.data));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(width as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(height as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let data = content
        .encode()
        .map_err(|e| PdfKitError::OperationError(format!("Content encoding failed: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), data));

    let mut xobjects = Dictionary::new();
    xobjects.set(IMAGE_RESOURCE, Object::Reference(image_id));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width as i64),
            Object::Integer(height as i64),
        ],
        "Resources" => dictionary! { "XObject" => xobjects },
        "Contents" => Object::Reference(content_id),
    }))
}
