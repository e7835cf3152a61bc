//! Page-model view of a PDF

use serde::{Deserialize, Serialize};

use crate::error::PdfKitError;
use crate::page_tree;
use crate::rotation::Rotation;

/// One page as seen by the page operations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Width in points, before rotation
    pub width: f32,
    /// Height in points, before rotation
    pub height: f32,
    pub rotation: Rotation,
}

impl PageEntry {
    /// Size as displayed, with width and height swapped for sideways pages
    pub fn displayed_size(&self) -> (f32, f32) {
        if self.rotation.is_sideways() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// Ordered pages of a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub pages: Vec<PageEntry>,
}

impl PageDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn rotations(&self) -> Vec<Rotation> {
        self.pages.iter().map(|p| p.rotation).collect()
    }
}

/// Read the page model out of PDF bytes
pub fn inspect(bytes: &[u8]) -> Result<PageDocument, PdfKitError> {
    let doc = page_tree::load(bytes)?;
    let pages = page_tree::page_ids(&doc)
        .into_iter()
        .map(|page_id| {
            let (width, height) = page_tree::page_size(&doc, page_id);
            PageEntry {
                width,
                height,
                rotation: page_tree::rotation(&doc, page_id),
            }
        })
        .collect();
    Ok(PageDocument { pages })
}
