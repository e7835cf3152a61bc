use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfKitError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("Invalid page index: {0}")]
    InvalidPage(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl From<pixel_core::PixelError> for PdfKitError {
    fn from(err: pixel_core::PixelError) -> Self {
        PdfKitError::Image(err.to_string())
    }
}
