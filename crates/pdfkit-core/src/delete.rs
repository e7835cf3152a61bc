//! Delete a set of pages

use std::collections::BTreeSet;

use tracing::info;

use crate::error::PdfKitError;
use crate::page_tree;

/// Remove the pages at the given zero-based indices
///
/// Every index is checked before anything is removed. Pages go from the
/// highest index down so earlier removals cannot shift later ones.
/// Removing every page leaves a valid document with an empty page tree.
pub fn delete_pages(bytes: &[u8], indices: &[u32]) -> Result<Vec<u8>, PdfKitError> {
    let mut doc = page_tree::load(bytes)?;
    let page_count = doc.get_pages().len() as u32;

    let unique: BTreeSet<u32> = indices.iter().copied().collect();
    if let Some(&bad) = unique.iter().find(|&&i| i >= page_count) {
        return Err(PdfKitError::InvalidPage(format!(
            "Page index {} does not exist (document has {} pages)",
            bad, page_count
        )));
    }

    for &index in unique.iter().rev() {
        doc.delete_pages(&[index + 1]);
    }

    doc.prune_objects();
    doc.compress();
    let out = page_tree::save(&mut doc)?;
    info!(
        removed = unique.len(),
        remaining = page_count as usize - unique.len(),
        "delete pages complete"
    );
    Ok(out)
}
