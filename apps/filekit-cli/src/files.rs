//! Local filesystem side of the file acquisition and output delivery boundaries

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared_types::{InputFile, OutputFile};
use tracing::info;

/// Read a file and wrap it as an [`InputFile`]; the MIME hint is left empty
/// so the format comes from the name
pub fn read_input(path: &Path) -> Result<InputFile> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(InputFile::new(name, "", bytes))
}

pub fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
    paths.iter().map(|p| read_input(p)).collect()
}

/// Write `output` into `dir` under its own file name
pub fn deliver(dir: &Path, output: &OutputFile) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(&output.filename);
    fs::write(&path, &output.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), mime = %output.mime_type, bytes = output.bytes.len(), "wrote output");
    Ok(path)
}
