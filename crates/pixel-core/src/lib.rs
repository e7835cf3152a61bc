//! Client-side image transforms
//!
//! - [`fill`]: replace a rectangular region with an average of its surroundings
//! - [`display`]: map pointer coordinates on a scaled preview to source pixels
//! - [`batch`]: run the fill over many images in order, isolating failures
//! - [`codec`]: PNG/JPEG/WebP bytes to and from [`Bitmap`]

pub mod batch;
pub mod bitmap;
pub mod codec;
pub mod display;
pub mod error;
pub mod fill;
pub mod region;
pub mod removal;

pub use batch::{BatchItem, BatchPipeline, BatchProgress, ItemOutcome, Selection};
pub use bitmap::Bitmap;
pub use codec::{decode, encode, DecodedImage, EncodeOptions};
pub use display::{
    DisplayBounds, DisplayPoint, DisplayRect, DisplayTransform, SelectionGesture, SourcePoint,
};
pub use error::PixelError;
pub use fill::{fill, fill_with, FillOptions};
pub use region::Region;
pub use removal::{remove_selection, RemovalOptions, RemovalOutcome};
