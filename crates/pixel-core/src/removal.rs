//! Interactive single-image removal: decode, map the drawn selection to
//! source pixels, fill, encode.

use shared_types::{FormatKind, InputFile, OutputFile};
use tracing::info;

use crate::codec::{self, EncodeOptions};
use crate::display::{DisplayBounds, DisplayRect, DisplayTransform};
use crate::error::PixelError;
use crate::fill::{fill_with, FillOptions};
use crate::region::Region;

pub const OUTPUT_PREFIX: &str = "no-watermark-";

#[derive(Debug, Clone, Default)]
pub struct RemovalOptions {
    pub bounds: DisplayBounds,
    pub fill: FillOptions,
    pub encode: EncodeOptions,
    /// Output format; defaults to the input's own format
    pub output_format: Option<FormatKind>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome {
    Removed { region: Region, output: OutputFile },
    /// The drawn rectangle was too small to act on
    NoSelection,
}

/// Name of the file produced for `input_name`
pub fn output_name(input_name: &str) -> String {
    format!("{}{}", OUTPUT_PREFIX, input_name)
}

/// Remove the area under `selection`, drawn on a preview of `file` laid out
/// with `options.bounds`
pub fn remove_selection(
    file: &InputFile,
    selection: DisplayRect,
    options: &RemovalOptions,
) -> Result<RemovalOutcome, PixelError> {
    if !selection.is_selection() {
        return Ok(RemovalOutcome::NoSelection);
    }

    let decoded = codec::decode(&file.bytes)?;
    let transform = DisplayTransform::for_bitmap(&decoded.bitmap, options.bounds);
    let region = transform.region_for(&decoded.bitmap, selection)?;

    let filled = fill_with(&decoded.bitmap, region, &options.fill);
    let format = options.output_format.unwrap_or(decoded.format);
    let bytes = codec::encode(&filled, format, &options.encode)?;

    info!(
        file = %file.name,
        scale = transform.scale(),
        ?region,
        "Removed selected area"
    );

    Ok(RemovalOutcome::Removed {
        region,
        output: OutputFile::new(output_name(&file.name), format, bytes),
    })
}
