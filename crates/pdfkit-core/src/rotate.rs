//! Rotate every page by a relative quarter turn

use lopdf::Object;
use tracing::info;

use crate::error::PdfKitError;
use crate::page_tree;
use crate::rotation::RotationDelta;

/// Add `delta` to each page's effective rotation
///
/// The result is written onto the page itself, overriding any value the page
/// inherited from the page tree.
pub fn rotate_pages(bytes: &[u8], delta: RotationDelta) -> Result<Vec<u8>, PdfKitError> {
    let mut doc = page_tree::load(bytes)?;
    let page_ids = page_tree::page_ids(&doc);

    for &page_id in &page_ids {
        let next = page_tree::rotation(&doc, page_id).rotate(delta);
        page_tree::page_dict_mut(&mut doc, page_id)?
            .set("Rotate", Object::Integer(next.degrees()));
    }

    let out = page_tree::save(&mut doc)?;
    info!(pages = page_ids.len(), delta = delta.degrees(), "rotate complete");
    Ok(out)
}
