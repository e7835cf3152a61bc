//! Typed file format, resolved once from a MIME hint or file name.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported file type: {0}")]
pub struct UnsupportedFormat(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatKind {
    Png,
    Jpeg,
    Webp,
    Pdf,
    Xlsx,
    Docx,
}

impl FormatKind {
    /// Determine the format from the host's MIME hint, falling back to the
    /// file extension when the hint is empty or unrecognized
    pub fn detect(mime_hint: &str, file_name: &str) -> Result<Self, UnsupportedFormat> {
        if let Some(kind) = Self::from_mime(mime_hint) {
            return Ok(kind);
        }
        Self::from_file_name(file_name)
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "application/pdf" => Some(Self::Pdf),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(Self::Xlsx)
            }
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Docx)
            }
            _ => None,
        }
    }

    pub fn from_file_name(file_name: &str) -> Result<Self, UnsupportedFormat> {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| UnsupportedFormat(file_name.to_string()))?;

        match ext.as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            "pdf" => Ok(Self::Pdf),
            "xlsx" | "xls" => Ok(Self::Xlsx),
            "docx" | "doc" => Ok(Self::Docx),
            _ => Err(UnsupportedFormat(file_name.to_string())),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
        }
    }

    pub fn is_image(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Webp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefers_mime() {
        assert_eq!(
            FormatKind::detect("image/webp", "photo.png").unwrap(),
            FormatKind::Webp
        );
    }

    #[test]
    fn test_detect_falls_back_to_extension() {
        assert_eq!(FormatKind::detect("", "Report.PDF").unwrap(), FormatKind::Pdf);
        assert_eq!(
            FormatKind::detect("application/octet-stream", "a.JPEG").unwrap(),
            FormatKind::Jpeg
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = FormatKind::detect("", "notes.txt").unwrap_err();
        assert!(err.to_string().contains("notes.txt"));
        assert!(FormatKind::detect("", "no_extension").is_err());
    }

    #[test]
    fn test_image_kinds() {
        assert!(FormatKind::Png.is_image());
        assert!(FormatKind::Webp.is_image());
        assert!(!FormatKind::Pdf.is_image());
        assert!(!FormatKind::Xlsx.is_image());
    }
}
