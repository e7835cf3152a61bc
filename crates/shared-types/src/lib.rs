pub mod format;
pub mod types;

pub use format::{FormatKind, UnsupportedFormat};
pub use types::{InputFile, OutputFile};
