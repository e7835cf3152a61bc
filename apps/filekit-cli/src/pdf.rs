//! PDF subcommands

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pdfkit_core::command::{
    split_name, COMPRESSED_NAME, IMAGES_NAME, MERGED_NAME, PAGES_REMOVED_NAME, ROTATED_NAME,
    WITH_TEXT_NAME,
};
use pdfkit_core::{PdfCommand, RotationDelta, TextOverlay};
use shared_types::OutputFile;
use tracing::{info, warn};

use crate::files::{deliver, read_input, read_inputs};

fn read_pdf(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_pdf(out: &Path, name: &str, bytes: Vec<u8>) -> Result<()> {
    let path = deliver(out, &OutputFile::pdf(name, bytes))?;
    println!("{}", path.display());
    Ok(())
}

pub fn merge(files: &[PathBuf], out: &Path) -> Result<()> {
    let documents = files.iter().map(|f| read_pdf(f)).collect::<Result<Vec<_>>>()?;
    let merged = pdfkit_core::merge_documents(documents).context("Merge failed")?;
    write_pdf(out, MERGED_NAME, merged)
}

pub fn split(file: &Path, ranges: &str, out: &Path) -> Result<()> {
    let ranges = pdfkit_core::parse_ranges(ranges)?;
    let results = pdfkit_core::extract_ranges(&read_pdf(file)?, &ranges)?;

    let mut failed = 0;
    for (i, (range, result)) in ranges.iter().zip(results).enumerate() {
        match result {
            Ok(bytes) => write_pdf(out, &split_name(i + 1), bytes)?,
            Err(e) => {
                failed += 1;
                warn!(
                    "range {}-{} skipped: {}",
                    range.start + 1,
                    range.end + 1,
                    e
                );
            }
        }
    }
    if failed == ranges.len() {
        bail!("No range could be extracted");
    }
    Ok(())
}

pub fn rotate(file: &Path, degrees: i64, out: &Path) -> Result<()> {
    let delta = RotationDelta::try_from(degrees)?;
    let rotated = pdfkit_core::rotate_pages(&read_pdf(file)?, delta)?;
    write_pdf(out, ROTATED_NAME, rotated)
}

pub fn delete(file: &Path, pages: &str, out: &Path) -> Result<()> {
    let indices = pdfkit_core::parse_page_indices(pages)?;
    let remaining = pdfkit_core::delete_pages(&read_pdf(file)?, &indices)?;
    write_pdf(out, PAGES_REMOVED_NAME, remaining)
}

pub fn add_text(
    file: &Path,
    page: u32,
    text: String,
    x: f32,
    y: f32,
    size: f32,
    out: &Path,
) -> Result<()> {
    if page == 0 {
        bail!("Page numbers start at 1");
    }
    let overlay = TextOverlay::new(page - 1, text, x, y).with_size(size);
    let stamped = pdfkit_core::add_text(&read_pdf(file)?, &overlay)?;
    write_pdf(out, WITH_TEXT_NAME, stamped)
}

pub fn compress(file: &Path, out: &Path) -> Result<()> {
    let input = read_pdf(file)?;
    let compressed = pdfkit_core::compress_document(&input)?;
    info!(
        before = input.len(),
        after = compressed.len(),
        "compressed {}",
        file.display()
    );
    write_pdf(out, COMPRESSED_NAME, compressed)
}

pub fn inspect(file: &Path) -> Result<()> {
    let model = pdfkit_core::inspect(&read_pdf(file)?)?;
    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}

pub fn images_to_pdf(files: &[PathBuf], out: &Path) -> Result<()> {
    let inputs = read_inputs(files)?;
    let result = pdfkit_core::images_to_pdf(&inputs)?;
    for name in &result.skipped {
        warn!("{} is not an image, skipped", name);
    }
    if result.page_count == 0 {
        bail!("None of the inputs were images");
    }
    write_pdf(out, IMAGES_NAME, result.bytes)
}

/// Execute a [`PdfCommand`] read from a JSON file
pub fn run_json(path: &Path) -> Result<()> {
    let json = read_input(path)?;
    let command: PdfCommand =
        serde_json::from_slice(&json.bytes).context("Failed to parse command JSON")?;
    let result = pdfkit_core::execute(command);
    println!("{}", serde_json::to_string(&result)?);
    if !result.success {
        bail!(result.error.unwrap_or_default());
    }
    Ok(())
}
