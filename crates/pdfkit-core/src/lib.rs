//! Page-level PDF operations
//!
//! Every operation takes document bytes and returns new bytes; inputs are
//! never modified. Page indices are zero-based throughout the API; the
//! range parsers accept the 1-based numbers people type.

pub mod command;
pub mod compress;
pub mod delete;
pub mod document;
pub mod error;
pub mod images;
pub mod merge;
pub mod overlay;
mod page_tree;
pub mod rotate;
pub mod rotation;
pub mod split;

#[cfg(test)]
mod test_support;

pub use command::{execute, PartResult, PdfCommand, ProcessMetrics, ProcessResult};
pub use compress::{compress_document, compress_with, CompressOptions, DEFAULT_OBJECTS_PER_STREAM};
pub use delete::delete_pages;
pub use document::{inspect, PageDocument, PageEntry};
pub use error::PdfKitError;
pub use images::{images_to_pdf, ImagesPdf};
pub use merge::merge_documents;
pub use overlay::{add_text, TextOverlay, DEFAULT_TEXT_SIZE};
pub use rotate::rotate_pages;
pub use rotation::{Rotation, RotationDelta};
pub use split::{extract_ranges, split_document, PageRange};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfKitError> {
    let doc = page_tree::load(bytes)?;
    Ok(doc.get_pages().len() as u32)
}

/// Parse a 1-based page list like "1-3, 5" into zero-based ranges, one per
/// comma-separated part
pub fn parse_ranges(input: &str) -> Result<Vec<PageRange>, PdfKitError> {
    let mut ranges = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_page_number(start)?, parse_page_number(end)?),
            None => {
                let page = parse_page_number(part)?;
                (page, page)
            }
        };
        if start > end {
            return Err(PdfKitError::InvalidRange(format!(
                "Start {} > end {}",
                start, end
            )));
        }
        ranges.push(PageRange::new(start - 1, end - 1));
    }

    if ranges.is_empty() {
        return Err(PdfKitError::InvalidRange("No pages specified".into()));
    }
    Ok(ranges)
}

/// Parse a 1-based page list into sorted, unique zero-based indices
pub fn parse_page_indices(input: &str) -> Result<Vec<u32>, PdfKitError> {
    use std::collections::BTreeSet;

    let pages: BTreeSet<u32> = parse_ranges(input)?
        .into_iter()
        .flat_map(|r| r.start..=r.end)
        .collect();
    Ok(pages.into_iter().collect())
}

fn parse_page_number(text: &str) -> Result<u32, PdfKitError> {
    let text = text.trim();
    let page: u32 = text
        .parse()
        .map_err(|_| PdfKitError::InvalidRange(format!("Invalid page: {}", text)))?;
    if page == 0 {
        return Err(PdfKitError::InvalidRange(
            "Page numbers must be >= 1".into(),
        ));
    }
    Ok(page)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parsed_indices_are_sorted_unique_and_zero_based(
            parts in prop::collection::vec((1u32..50, 0u32..5), 1..6)
        ) {
            let input = parts
                .iter()
                .map(|(start, len)| format!("{}-{}", start, start + len))
                .collect::<Vec<_>>()
                .join(",");
            let indices = parse_page_indices(&input).unwrap();

            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            for (start, len) in parts {
                for page in start..=start + len {
                    prop_assert!(indices.contains(&(page - 1)));
                }
            }
        }
    }
}
