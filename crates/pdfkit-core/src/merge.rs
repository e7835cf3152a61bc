//! PDF Merge algorithm
//!
//! Concatenates the pages of several PDFs into one document.

use lopdf::Document;
use tracing::{debug, info};

use crate::error::PdfKitError;
use crate::page_tree::{self, remap_object_refs};

/// Merge PDFs into one, keeping input order and each input's page order
///
/// The algorithm:
/// 1. If empty, return error
/// 2. If a single document, validate it and return it unchanged
/// 3. Use the first document as the destination
/// 4. For each further document, shift its object ids past the destination's
///    highest id, import every object, and append its pages
/// 5. Flatten the page tree onto the destination's root Pages node, drop
///    the orphaned catalogs and page-tree nodes, and serialize
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfKitError> {
    if documents.is_empty() {
        return Err(PdfKitError::InvalidParameter("No documents to merge".into()));
    }

    if documents.len() == 1 {
        let mut documents = documents;
        let only = documents.remove(0);
        page_tree::load(&only)?;
        return Ok(only);
    }

    let mut loaded_docs = Vec::with_capacity(documents.len());
    for (i, doc_bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(doc_bytes).map_err(|e| {
            PdfKitError::ParseError(format!("Failed to load document {}: {}", i, e))
        })?;
        loaded_docs.push(doc);
    }

    let mut dest = loaded_docs.remove(0);
    let mut dest_max_id = dest.max_id;
    let mut dest_page_refs = page_tree::page_ids(&dest);

    for source in loaded_docs.into_iter() {
        let source_pages = page_tree::page_ids(&source);
        let id_offset = dest_max_id;

        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects
                .insert(new_id, remap_object_refs(object, id_offset));
        }

        dest_page_refs.extend(
            source_pages
                .into_iter()
                .map(|(num, generation)| (num + id_offset, generation)),
        );

        dest_max_id = (source.max_id + id_offset).max(dest_max_id);
    }

    dest.max_id = dest_max_id;
    page_tree::update_page_tree(&mut dest, &dest_page_refs)?;
    dest.prune_objects();
    dest.compress();

    debug!(pages = dest_page_refs.len(), "merged page tree");
    let bytes = page_tree::save(&mut dest)?;
    info!(
        inputs = documents.len(),
        pages = dest_page_refs.len(),
        bytes = bytes.len(),
        "merge complete"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::inspect;
    use crate::test_support::{create_test_pdf, page_labels};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No documents to merge"));
    }

    #[test]
    fn test_merge_single_document_returns_same() {
        let pdf = create_test_pdf(2, "Single");
        let result = merge_documents(vec![pdf.clone()]).unwrap();
        assert_eq!(result, pdf);
    }

    #[test]
    fn test_merge_single_unreadable_document_fails() {
        let result = merge_documents(vec![b"junk".to_vec()]);
        assert!(matches!(result, Err(PdfKitError::ParseError(_))));
    }

    #[test]
    fn test_merge_two_documents_combines_pages() {
        let doc_a = create_test_pdf(2, "DocA");
        let doc_b = create_test_pdf(3, "DocB");

        let merged = merge_documents(vec![doc_a, doc_b]).unwrap();
        assert_eq!(inspect(&merged).unwrap().page_count(), 5);
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let doc1 = create_test_pdf(2, "First");
        let doc2 = create_test_pdf(1, "Second");
        let doc3 = create_test_pdf(2, "Third");

        let merged = merge_documents(vec![doc1, doc2, doc3]).unwrap();

        assert_eq!(
            page_labels(&merged),
            vec![
                "First-Page-1",
                "First-Page-2",
                "Second-Page-1",
                "Third-Page-1",
                "Third-Page-2",
            ]
        );
    }

    #[test]
    fn test_merge_handles_different_sizes() {
        let doc1 = create_test_pdf(10, "Large");
        let doc2 = create_test_pdf(1, "Small");
        let doc3 = create_test_pdf(5, "Medium");

        let merged = merge_documents(vec![doc1, doc2, doc3]).unwrap();
        assert_eq!(inspect(&merged).unwrap().page_count(), 16);
    }

    #[test]
    fn test_merge_reports_which_input_is_broken() {
        let good = create_test_pdf(1, "Good");
        let err = merge_documents(vec![good, b"junk".to_vec()]).unwrap_err();
        assert!(err.to_string().contains("document 1"));
    }
}
