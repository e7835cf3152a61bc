//! Page tree helpers shared by the page operations

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::PdfKitError;
use crate::rotation::Rotation;

/// Page attributes a page may inherit from its ancestors in the page tree
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// US Letter, used when no MediaBox can be found
pub(crate) const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guard against cyclic Parent chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfKitError> {
    Document::load_mem(bytes).map_err(|e| PdfKitError::ParseError(e.to_string()))
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>, PdfKitError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfKitError::OperationError(format!("Save failed: {}", e)))?;
    Ok(buffer)
}

/// Page object ids in document order
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

pub(crate) fn page_dict(doc: &Document, page_id: ObjectId) -> Result<&Dictionary, PdfKitError> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfKitError::OperationError(format!("Page object {:?}: {}", page_id, e)))
}

pub(crate) fn page_dict_mut(
    doc: &mut Document,
    page_id: ObjectId,
) -> Result<&mut Dictionary, PdfKitError> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfKitError::OperationError(format!("Page object {:?}: {}", page_id, e)))
}

/// Follow a reference to its target, leaving direct objects as they are
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up `key` on the page, then on each ancestor Pages node
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_object(page_id).and_then(Object::as_dict).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value).cloned();
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_object(parent).and_then(Object::as_dict).ok()?;
    }
    None
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Effective MediaBox as `[llx, lly, urx, ury]`
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Object::Array(values)) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };
    if values.len() != 4 {
        return DEFAULT_MEDIA_BOX;
    }

    let mut out = [0.0f32; 4];
    for (slot, value) in out.iter_mut().zip(values.iter()) {
        match resolve(doc, value).and_then(number) {
            Some(n) => *slot = n,
            None => return DEFAULT_MEDIA_BOX,
        }
    }
    out
}

/// Page width and height in points
pub(crate) fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let [llx, lly, urx, ury] = media_box(doc, page_id);
    ((urx - llx).abs(), (ury - lly).abs())
}

/// Effective page rotation, normalized
pub(crate) fn rotation(doc: &Document, page_id: ObjectId) -> Rotation {
    match inherited_attribute(doc, page_id, b"Rotate") {
        Some(Object::Integer(deg)) => Rotation::normalize(deg),
        Some(Object::Real(deg)) => Rotation::normalize(deg.round() as i64),
        _ => Rotation::Deg0,
    }
}

/// Copy inherited attributes onto the page itself so it keeps its look when
/// re-parented under a different Pages node
pub(crate) fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfKitError> {
    let mut missing = Vec::new();
    {
        let dict = page_dict(doc, page_id)?;
        for key in INHERITABLE {
            if !dict.has(key) {
                if let Some(value) = inherited_attribute(doc, page_id, key) {
                    missing.push((key.to_vec(), value));
                }
            }
        }
    }

    let dict = page_dict_mut(doc, page_id)?;
    for (key, value) in missing {
        dict.set(key, value);
    }
    Ok(())
}

/// Id of the root Pages node
pub(crate) fn root_pages_id(doc: &Document) -> Result<ObjectId, PdfKitError> {
    let catalog = doc
        .catalog()
        .map_err(|e| PdfKitError::OperationError(format!("Invalid catalog: {}", e)))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfKitError::OperationError("No Pages in catalog".into()))
}

/// Replace the page tree with a single flat Pages node listing `page_refs`
pub(crate) fn update_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfKitError> {
    let pages_id = root_pages_id(doc)?;

    for &page_id in page_refs {
        materialize_inherited(doc, page_id)?;
    }
    for &page_id in page_refs {
        page_dict_mut(doc, page_id)?.set("Parent", Object::Reference(pages_id));
    }

    if let Some(Object::Dictionary(ref mut pages_dict)) = doc.objects.get_mut(&pages_id) {
        let kids = page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        pages_dict.set("Kids", Object::Array(kids));
        pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
        for key in INHERITABLE {
            pages_dict.remove(key);
        }
    } else {
        return Err(PdfKitError::OperationError(
            "Invalid pages dictionary".into(),
        ));
    }

    Ok(())
}

/// Recursively shift object references by `offset`
pub(crate) fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            remap_dict(&mut dict, offset);
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            remap_dict(&mut stream.dict, offset);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn remap_dict(dict: &mut Dictionary, offset: u32) {
    for (_, value) in dict.iter_mut() {
        *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
    }
}
