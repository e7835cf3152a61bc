//! Values that cross the file acquisition and output delivery boundaries.

use crate::format::{FormatKind, UnsupportedFormat};

/// Raw file handed to the core by the host application
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InputFile {
    pub name: String,
    /// MIME type reported by the host, often empty for drag-and-drop sources
    #[serde(default)]
    pub mime_hint: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_hint: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_hint: mime_hint.into(),
            bytes,
        }
    }

    /// Resolve the typed format once, at the boundary
    pub fn format(&self) -> Result<FormatKind, UnsupportedFormat> {
        FormatKind::detect(&self.mime_hint, &self.name)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Transformed bytes handed back to the host for delivery
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OutputFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(filename: impl Into<String>, format: FormatKind, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: format.mime_type().to_string(),
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, FormatKind::Pdf, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_file_format_uses_mime_first() {
        let file = InputFile::new("scan.bin", "image/png", vec![1, 2, 3]);
        assert_eq!(file.format().unwrap(), FormatKind::Png);
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn test_output_file_carries_mime() {
        let out = OutputFile::pdf("merged.pdf", b"%PDF-1.7".to_vec());
        assert_eq!(out.mime_type, "application/pdf");
        assert_eq!(out.filename, "merged.pdf");
    }

    #[test]
    fn test_input_file_deserializes_without_mime() {
        let json = r#"{"name":"a.jpg","bytes":[255,216]}"#;
        let file: InputFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.mime_hint, "");
        assert_eq!(file.format().unwrap(), FormatKind::Jpeg);
    }
}
