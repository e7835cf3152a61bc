//! PDF Split algorithm
//!
//! Extracts inclusive page ranges, one output document per range.

use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PdfKitError;
use crate::page_tree;

/// Inclusive, zero-based page range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn single(index: u32) -> Self {
        Self::new(index, index)
    }

    /// Number of pages the range selects
    pub fn page_count(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    /// Check the range against a document with `page_count` pages
    pub fn validate(&self, page_count: u32) -> Result<(), PdfKitError> {
        if self.start > self.end {
            return Err(PdfKitError::InvalidRange(format!(
                "Start {} > end {}",
                self.start, self.end
            )));
        }
        if self.end >= page_count {
            return Err(PdfKitError::InvalidRange(format!(
                "Page index {} does not exist (document has {} pages)",
                self.end, page_count
            )));
        }
        Ok(())
    }
}

/// Extract each range into its own document
///
/// Every range gets its own result, so one bad range does not cost the others.
/// An unreadable input fails the whole call.
pub fn extract_ranges(
    bytes: &[u8],
    ranges: &[PageRange],
) -> Result<Vec<Result<Vec<u8>, PdfKitError>>, PdfKitError> {
    if ranges.is_empty() {
        return Err(PdfKitError::InvalidRange("No ranges specified".into()));
    }

    let doc = page_tree::load(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    debug!(page_count, ranges = ranges.len(), "splitting document");

    Ok(ranges
        .iter()
        .map(|range| {
            let result = range
                .validate(page_count)
                .and_then(|_| extract_one(&doc, page_count, *range));
            if let Err(err) = &result {
                warn!(start = range.start, end = range.end, %err, "range rejected");
            }
            result
        })
        .collect())
}

/// Extract a single range
pub fn split_document(bytes: &[u8], range: PageRange) -> Result<Vec<u8>, PdfKitError> {
    let doc = page_tree::load(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    range.validate(page_count)?;
    extract_one(&doc, page_count, range)
}

fn extract_one(doc: &Document, page_count: u32, range: PageRange) -> Result<Vec<u8>, PdfKitError> {
    let mut new_doc = doc.clone();

    // lopdf numbers pages from 1; delete from the back so numbers stay valid
    let to_delete = (1..=page_count)
        .rev()
        .filter(|n| !(range.start + 1..=range.end + 1).contains(n));
    for page_num in to_delete {
        new_doc.delete_pages(&[page_num]);
    }

    new_doc.prune_objects();
    new_doc.compress();
    page_tree::save(&mut new_doc)
}
