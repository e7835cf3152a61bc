//! Place a line of text on a page

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PdfKitError;
use crate::page_tree;

pub const DEFAULT_TEXT_SIZE: f32 = 12.0;

const FONT_BASE_NAME: &str = "Helv";

fn default_text_size() -> f32 {
    DEFAULT_TEXT_SIZE
}

/// Text to draw, anchored from the top-left corner of the page's MediaBox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Zero-based page index
    pub page_index: u32,
    pub text: String,
    pub x: f32,
    /// Distance from the top edge, in points
    pub y: f32,
    #[serde(default = "default_text_size")]
    pub size: f32,
}

impl TextOverlay {
    pub fn new(page_index: u32, text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            page_index,
            text: text.into(),
            x,
            y,
            size: DEFAULT_TEXT_SIZE,
        }
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// Draw `overlay` in Helvetica on top of the existing page content
///
/// An invalid page index fails the whole operation; no document is produced.
pub fn add_text(bytes: &[u8], overlay: &TextOverlay) -> Result<Vec<u8>, PdfKitError> {
    if !(overlay.size.is_finite() && overlay.size > 0.0) {
        return Err(PdfKitError::InvalidParameter(format!(
            "Text size must be positive, got {}",
            overlay.size
        )));
    }
    if !(overlay.x.is_finite() && overlay.y.is_finite()) {
        return Err(PdfKitError::InvalidParameter("Text position must be finite".into()));
    }
    let encoded = encode_win_ansi(&overlay.text)?;

    let mut doc = page_tree::load(bytes)?;
    let page_ids = page_tree::page_ids(&doc);
    let page_id = *page_ids
        .get(overlay.page_index as usize)
        .ok_or_else(|| {
            PdfKitError::InvalidPage(format!(
                "Page index {} does not exist (document has {} pages)",
                overlay.page_index,
                page_ids.len()
            ))
        })?;

    let [llx, lly, urx, ury] = page_tree::media_box(&doc, page_id);
    let page_height = (ury - lly).abs();
    let x = llx.min(urx) + overlay.x;
    let y_from_bottom = lly.min(ury) + page_height - overlay.y;
    debug!(page = overlay.page_index, x, y_from_bottom, "placing text");

    let font_name = register_font(&mut doc, page_id)?;

    let save_state = Content {
        operations: vec![Operation::new("q", vec![])],
    };
    let text = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font_name.into_bytes()), Object::Real(overlay.size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y_from_bottom)]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ],
    };
    let before = add_content_stream(&mut doc, save_state)?;
    let after = add_content_stream(&mut doc, text)?;

    let mut contents = vec![Object::Reference(before)];
    contents.extend(
        doc.get_page_contents(page_id)
            .into_iter()
            .map(Object::Reference),
    );
    contents.push(Object::Reference(after));
    page_tree::page_dict_mut(&mut doc, page_id)?.set("Contents", Object::Array(contents));

    let out = page_tree::save(&mut doc)?;
    info!(page = overlay.page_index, chars = overlay.text.chars().count(), "text overlay complete");
    Ok(out)
}

/// Readers concatenate a page's content streams without separators, so each
/// added stream is padded with whitespace on both ends
fn add_content_stream(doc: &mut lopdf::Document, content: Content) -> Result<ObjectId, PdfKitError> {
    let encoded = content
        .encode()
        .map_err(|e| PdfKitError::OperationError(format!("Content encoding failed: {}", e)))?;
    let mut data = Vec::with_capacity(encoded.len() + 2);
    data.push(b'\n');
    data.extend_from_slice(&encoded);
    data.push(b'\n');
    Ok(doc.add_object(Stream::new(Dictionary::new(), data)))
}

/// Give the page its own Resources carrying a Helvetica font entry, and
/// return the resource name the font was registered under
fn register_font(doc: &mut lopdf::Document, page_id: ObjectId) -> Result<String, PdfKitError> {
    let mut resources = match page_tree::inherited_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => match page_tree::resolve(doc, obj) {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };

    let font_name = unused_name(&fonts);
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    fonts.set(font_name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    page_tree::page_dict_mut(doc, page_id)?.set("Resources", Object::Dictionary(resources));
    Ok(font_name)
}

fn unused_name(fonts: &Dictionary) -> String {
    let mut candidate = FONT_BASE_NAME.to_string();
    let mut n = 1;
    while fonts.has(candidate.as_bytes()) {
        candidate = format!("{}{}", FONT_BASE_NAME, n);
        n += 1;
    }
    candidate
}

/// Encode text for a WinAnsiEncoding simple font
fn encode_win_ansi(text: &str) -> Result<Vec<u8>, PdfKitError> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => Ok(0x80),
            '\u{2026}' => Ok(0x85),
            '\u{2018}' => Ok(0x91),
            '\u{2019}' => Ok(0x92),
            '\u{201C}' => Ok(0x93),
            '\u{201D}' => Ok(0x94),
            '\u{2022}' => Ok(0x95),
            '\u{2013}' => Ok(0x96),
            '\u{2014}' => Ok(0x97),
            '\u{80}'..='\u{9F}' => Err(c),
            c if (c as u32) <= 0xFF => Ok(c as u8),
            c => Err(c),
        })
        .collect::<Result<Vec<u8>, char>>()
        .map_err(|c| {
            PdfKitError::InvalidParameter(format!(
                "Character {:?} cannot be drawn with the standard font",
                c
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, page_labels};
    use lopdf::Document;
    use pretty_assertions::assert_eq;

    fn operations(pdf: &[u8], index: usize) -> Vec<Operation> {
        let doc = Document::load_mem(pdf).unwrap();
        let page_id = doc.get_pages().into_values().nth(index).unwrap();
        Content::decode(&doc.get_page_content(page_id).unwrap())
            .unwrap()
            .operations
    }

    #[test]
    fn test_text_is_drawn_after_existing_content() {
        let pdf = create_test_pdf(2, "Ov");
        let out = add_text(&pdf, &TextOverlay::new(0, "Hello", 50.0, 100.0)).unwrap();
        assert_eq!(page_labels(&out), vec!["Ov-Page-1 Hello", "Ov-Page-2"]);
    }

    #[test]
    fn test_y_is_measured_from_the_top() {
        let pdf = create_test_pdf(1, "Ov");
        let out = add_text(&pdf, &TextOverlay::new(0, "Hi", 50.0, 100.0)).unwrap();

        let ops = operations(&out, 0);
        let td = ops.iter().rev().find(|op| op.operator == "Td").unwrap();
        assert_eq!(td.operands[0].as_float().unwrap(), 50.0);
        assert_eq!(td.operands[1].as_float().unwrap(), 692.0);
    }

    #[test]
    fn test_existing_content_is_wrapped_in_saved_state() {
        let pdf = create_test_pdf(1, "Ov");
        let out = add_text(&pdf, &TextOverlay::new(0, "Hi", 10.0, 10.0).with_size(20.0)).unwrap();

        let ops = operations(&out, 0);
        assert_eq!(ops.first().unwrap().operator, "q");
        let restore = ops.iter().position(|op| op.operator == "Q").unwrap();
        let font = ops.iter().rposition(|op| op.operator == "Tf").unwrap();
        assert!(restore < font);
        assert_eq!(ops[font].operands[1].as_float().unwrap(), 20.0);
    }

    #[test]
    fn test_operators_do_not_run_together_across_streams() {
        let pdf = create_test_pdf(1, "Ov");
        let out = add_text(&pdf, &TextOverlay::new(0, "Hi", 10.0, 10.0)).unwrap();

        let operators: Vec<String> = operations(&out, 0)
            .into_iter()
            .map(|op| op.operator)
            .collect();
        assert_eq!(
            operators,
            vec!["q", "BT", "Tf", "Td", "Tj", "ET", "Q", "BT", "Tf", "Td", "Tj", "ET"]
        );
    }

    #[test]
    fn test_position_is_relative_to_media_box_origin() {
        let mut doc = Document::load_mem(&create_test_pdf(1, "Ov")).unwrap();
        let page_id = doc.get_pages()[&1];
        doc.get_dictionary_mut(page_id).unwrap().set(
            "MediaBox",
            vec![
                Object::Integer(100),
                Object::Integer(200),
                Object::Integer(400),
                Object::Integer(600),
            ],
        );
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf).unwrap();

        let out = add_text(&pdf, &TextOverlay::new(0, "Hi", 10.0, 50.0)).unwrap();

        let ops = operations(&out, 0);
        let td = ops.iter().rev().find(|op| op.operator == "Td").unwrap();
        // Top-left of the visible page is (100, 600)
        assert_eq!(td.operands[0].as_float().unwrap(), 110.0);
        assert_eq!(td.operands[1].as_float().unwrap(), 550.0);
    }

    #[test]
    fn test_invalid_page_aborts() {
        let pdf = create_test_pdf(2, "Ov");
        let result = add_text(&pdf, &TextOverlay::new(2, "Hi", 0.0, 0.0));
        assert!(matches!(result, Err(PdfKitError::InvalidPage(_))));
    }

    #[test]
    fn test_non_positive_size_is_rejected() {
        let pdf = create_test_pdf(1, "Ov");
        let result = add_text(&pdf, &TextOverlay::new(0, "Hi", 0.0, 0.0).with_size(0.0));
        assert!(matches!(result, Err(PdfKitError::InvalidParameter(_))));
    }

    #[test]
    fn test_font_name_avoids_existing_resources() {
        let mut fonts = Dictionary::new();
        fonts.set("Helv", Object::Null);
        fonts.set("Helv1", Object::Null);
        assert_eq!(unused_name(&fonts), "Helv2");
        assert_eq!(unused_name(&Dictionary::new()), "Helv");
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Café €5").unwrap(), b"Caf\xe9 \x805".to_vec());
        assert!(encode_win_ansi("日本").is_err());
    }

    #[test]
    fn test_overlay_size_defaults_when_absent() {
        let overlay: TextOverlay =
            serde_json::from_str(r#"{"page_index":0,"text":"a","x":1,"y":2}"#).unwrap();
        assert_eq!(overlay.size, DEFAULT_TEXT_SIZE);
    }
}
