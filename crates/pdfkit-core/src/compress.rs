//! Structural compression: re-serialize with shared object streams

use chrono::Utc;
use lopdf::{Document, Object, SaveOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::PdfKitError;
use crate::page_tree;

const PRODUCER: &str = "pdfkit";

/// Objects packed into each object stream
pub const DEFAULT_OBJECTS_PER_STREAM: usize = 100;

/// Deflate level for the packed object streams
const OBJECT_STREAM_COMPRESSION: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressOptions {
    pub objects_per_stream: usize,
    /// Stamp `/ModDate` in the document information dictionary
    pub update_mod_date: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            objects_per_stream: DEFAULT_OBJECTS_PER_STREAM,
            update_mod_date: true,
        }
    }
}

pub fn compress_document(bytes: &[u8]) -> Result<Vec<u8>, PdfKitError> {
    compress_with(bytes, &CompressOptions::default())
}

/// Drop unreachable objects, deflate streams and pack the remaining objects
/// into object streams. Page content is untouched.
pub fn compress_with(bytes: &[u8], options: &CompressOptions) -> Result<Vec<u8>, PdfKitError> {
    let doc = page_tree::load(bytes)?;
    let out = compress_loaded(doc, options)?;
    info!(
        input_bytes = bytes.len(),
        output_bytes = out.len(),
        "compress complete"
    );
    Ok(out)
}

fn compress_loaded(mut doc: Document, options: &CompressOptions) -> Result<Vec<u8>, PdfKitError> {
    let before = doc.objects.len();
    doc.prune_objects();
    doc.compress();

    if options.update_mod_date {
        stamp_mod_date(&mut doc);
    }

    // Objects inside an object stream cannot be encrypted on their own, so
    // encrypted files keep the classic layout
    if doc.is_encrypted() {
        warn!("document carries encryption metadata, writing without object streams");
        return page_tree::save(&mut doc);
    }

    doc.renumber_objects();
    debug!(before, after = doc.objects.len(), "pruned unreachable objects");

    let save_options = SaveOptions::builder()
        .use_object_streams(true)
        .use_xref_streams(true)
        .max_objects_per_stream(options.objects_per_stream.max(1))
        .compression_level(OBJECT_STREAM_COMPRESSION)
        .build();
    let mut out = Vec::new();
    doc.save_with_options(&mut out, save_options)
        .map_err(|e| PdfKitError::SerializationError(format!("Failed to save PDF: {}", e)))?;
    Ok(out)
}

fn stamp_mod_date(doc: &mut Document) {
    let now = Utc::now().format("D:%Y%m%d%H%M%S+00'00'").to_string();
    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let id = doc.add_object(lopdf::Dictionary::new());
            doc.trailer.set("Info", Object::Reference(id));
            id
        }
    };

    match doc.get_object_mut(info_id).and_then(Object::as_dict_mut) {
        Ok(info) => {
            info.set("ModDate", Object::string_literal(now));
            info.set("Producer", Object::string_literal(PRODUCER));
        }
        Err(e) => warn!(%e, "information dictionary is not a dictionary, skipping ModDate"),
    }
}
