//! Image subcommands

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use pixel_core::{
    BatchPipeline, DisplayBounds, DisplayPoint, DisplayRect, EncodeOptions, FillOptions,
    ItemOutcome, Region, RemovalOptions, RemovalOutcome, Selection,
};
use shared_types::{FormatKind, OutputFile};
use tracing::{info, warn};

use crate::files::{deliver, read_input, read_inputs};

#[derive(Args, Debug)]
pub struct UnwatermarkArgs {
    pub file: PathBuf,
    /// Drag corners on the preview: x1,y1,x2,y2
    #[arg(long, value_parser = parse_corners)]
    pub rect: DisplayRect,
    /// Preview bounding box width
    #[arg(long, default_value_t = 600)]
    pub max_width: u32,
    /// Preview bounding box height
    #[arg(long, default_value_t = 400)]
    pub max_height: u32,
    /// Neighbourhood radius used for the fill
    #[arg(long, default_value_t = pixel_core::fill::DEFAULT_RADIUS)]
    pub radius: u32,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Region in source pixels: x,y,width,height. Omit to pass images through.
    #[arg(long, value_parser = parse_region)]
    pub region: Option<Region>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// png, jpeg or webp; defaults to the input's format
    #[arg(long, value_parser = parse_image_format)]
    pub format: Option<FormatKind>,
    /// JPEG quality, 1-100
    #[arg(long, default_value_t = pixel_core::codec::DEFAULT_JPEG_QUALITY)]
    pub quality: u8,
}

impl OutputArgs {
    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            jpeg_quality: self.quality,
        }
    }
}

fn parse_numbers<const N: usize>(input: &str) -> Result<[f64; N], String> {
    let values = input
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|_| format!("'{}' is not a number", v.trim())))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|_| format!("expected {} comma-separated numbers", N))
}

fn parse_corners(input: &str) -> Result<DisplayRect, String> {
    let [x1, y1, x2, y2] = parse_numbers::<4>(input)?;
    Ok(DisplayRect::from_corners(
        DisplayPoint::new(x1, y1),
        DisplayPoint::new(x2, y2),
    ))
}

fn parse_region(input: &str) -> Result<Region, String> {
    let values = parse_numbers::<4>(input)?;
    if values.iter().any(|v| *v < 0.0 || v.fract() != 0.0) {
        return Err("region values must be non-negative whole pixels".into());
    }
    let [x, y, w, h] = values.map(|v| v as u32);
    Ok(Region::new(x, y, w, h))
}

fn parse_image_format(input: &str) -> Result<FormatKind, String> {
    let format = FormatKind::from_file_name(&format!("x.{}", input.trim()))
        .map_err(|e| e.to_string())?;
    if !format.is_image() {
        return Err(format!("{} is not an image format", input));
    }
    Ok(format)
}

pub fn unwatermark(args: &UnwatermarkArgs, out: &Path) -> Result<()> {
    let input = read_input(&args.file)?;
    let options = RemovalOptions {
        bounds: DisplayBounds {
            max_width: args.max_width,
            max_height: args.max_height,
        },
        fill: FillOptions { radius: args.radius },
        encode: args.output.encode_options(),
        output_format: args.output.format,
    };

    match pixel_core::remove_selection(&input, args.rect, &options)
        .with_context(|| format!("Failed to process {}", input.name))?
    {
        RemovalOutcome::Removed { region, output } => {
            info!(?region, "filled region");
            println!("{}", deliver(out, &output)?.display());
            Ok(())
        }
        RemovalOutcome::NoSelection => {
            bail!("Selection is too small; drag at least 2x2 on the preview")
        }
    }
}

pub async fn batch(args: &BatchArgs, out: &Path) -> Result<()> {
    let inputs = read_inputs(&args.files)?;
    let selection = args.region.map_or(Selection::WholeFrame, Selection::Region);
    let pipeline = BatchPipeline::new(FillOptions::default(), args.output.encode_options());

    let outcomes = pipeline
        .run_uniform(inputs, selection, |p| {
            info!("{}/{} ({:.0}%)", p.completed, p.total, p.percent());
        })
        .await;

    let mut failures = 0;
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Success(output) => {
                let output = match args.output.format {
                    Some(format) => reencode(output, format, &args.output.encode_options())?,
                    None => output,
                };
                println!("{}", deliver(out, &output)?.display());
            }
            ItemOutcome::Failure { name, reason } => {
                failures += 1;
                warn!("{} failed: {}", name, reason);
            }
        }
    }
    if failures > 0 {
        bail!("{} of {} images failed", failures, args.files.len());
    }
    Ok(())
}

fn reencode(output: OutputFile, format: FormatKind, options: &EncodeOptions) -> Result<OutputFile> {
    let decoded = pixel_core::decode(&output.bytes)?;
    let bytes = pixel_core::encode(&decoded.bitmap, format, options)?;
    Ok(OutputFile::new(
        with_extension(&output.filename, format),
        format,
        bytes,
    ))
}

pub fn convert(args: &ConvertArgs, out: &Path) -> Result<()> {
    let input = read_input(&args.file)?;
    let decoded = pixel_core::decode(&input.bytes)
        .with_context(|| format!("Failed to decode {}", input.name))?;
    let format = args
        .output
        .format
        .ok_or_else(|| anyhow!("--format is required for convert"))?;
    let bytes = pixel_core::encode(&decoded.bitmap, format, &args.output.encode_options())?;
    let output = OutputFile::new(with_extension(&input.name, format), format, bytes);
    println!("{}", deliver(out, &output)?.display());
    Ok(())
}

fn with_extension(name: &str, format: FormatKind) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    format!("{}.{}", stem, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_corners_normalize_drag_direction() {
        let rect = parse_corners("300, 200, 100, 50").unwrap();
        assert_eq!(rect, DisplayRect::from_corners(DisplayPoint::new(100.0, 50.0), DisplayPoint::new(300.0, 200.0)));
        assert_eq!((rect.width, rect.height), (200.0, 150.0));
    }

    #[test]
    fn test_bad_number_lists() {
        assert!(parse_corners("1,2,3").is_err());
        assert!(parse_corners("1,2,3,four").is_err());
        assert!(parse_region("1,2,-3,4").is_err());
        assert!(parse_region("1.5,2,3,4").is_err());
    }

    #[test]
    fn test_region_parses() {
        assert_eq!(parse_region("10,20,30,40").unwrap(), Region::new(10, 20, 30, 40));
    }

    #[test]
    fn test_image_format_names() {
        assert_eq!(parse_image_format("jpg").unwrap(), FormatKind::Jpeg);
        assert_eq!(parse_image_format("webp").unwrap(), FormatKind::Webp);
        assert!(parse_image_format("pdf").is_err());
        assert!(parse_image_format("gif").is_err());
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(with_extension("no-watermark-cat.png", FormatKind::Jpeg), "no-watermark-cat.jpg");
    }
}
