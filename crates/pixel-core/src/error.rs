use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

impl From<shared_types::UnsupportedFormat> for PixelError {
    fn from(err: shared_types::UnsupportedFormat) -> Self {
        PixelError::UnsupportedFormat(err.0)
    }
}
