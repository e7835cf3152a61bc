//! JSON command dispatch over the page operations

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use shared_types::InputFile;
use tracing::{debug, error};

use crate::compress::{compress_with, CompressOptions};
use crate::delete::delete_pages;
use crate::error::PdfKitError;
use crate::get_page_count;
use crate::images::images_to_pdf;
use crate::merge::merge_documents;
use crate::overlay::{add_text, TextOverlay};
use crate::rotate::rotate_pages;
use crate::rotation::RotationDelta;
use crate::split::{extract_ranges, PageRange};

pub const MERGED_NAME: &str = "merged.pdf";
pub const ROTATED_NAME: &str = "rotated.pdf";
pub const PAGES_REMOVED_NAME: &str = "pages-removed.pdf";
pub const WITH_TEXT_NAME: &str = "with-text.pdf";
pub const COMPRESSED_NAME: &str = "compressed.pdf";
pub const IMAGES_NAME: &str = "images.pdf";

/// Name of the `n`th split output, counting from 1
pub fn split_name(n: usize) -> String {
    format!("split-{}.pdf", n)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Merge {
        files: Vec<Vec<u8>>,
    },
    Split {
        file: Vec<u8>,
        ranges: Vec<PageRange>,
    },
    Rotate {
        file: Vec<u8>,
        degrees: RotationDelta,
    },
    DeletePages {
        file: Vec<u8>,
        /// Zero-based page indices
        pages: Vec<u32>,
    },
    AddText {
        file: Vec<u8>,
        overlay: TextOverlay,
    },
    Compress {
        file: Vec<u8>,
        #[serde(default)]
        options: CompressOptions,
    },
    ImagesToPdf {
        files: Vec<InputFile>,
    },
}

impl PdfCommand {
    fn input_size(&self) -> usize {
        match self {
            PdfCommand::Merge { files } => files.iter().map(Vec::len).sum(),
            PdfCommand::ImagesToPdf { files } => files.iter().map(InputFile::size).sum(),
            PdfCommand::Split { file, .. }
            | PdfCommand::Rotate { file, .. }
            | PdfCommand::DeletePages { file, .. }
            | PdfCommand::AddText { file, .. }
            | PdfCommand::Compress { file, .. } => file.len(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PdfCommand::Merge { .. } => "Merge",
            PdfCommand::Split { .. } => "Split",
            PdfCommand::Rotate { .. } => "Rotate",
            PdfCommand::DeletePages { .. } => "DeletePages",
            PdfCommand::AddText { .. } => "AddText",
            PdfCommand::Compress { .. } => "Compress",
            PdfCommand::ImagesToPdf { .. } => "ImagesToPdf",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data for single-output commands
    pub data: Option<String>,
    /// One entry per range for Split
    pub parts: Vec<PartResult>,
    /// Inputs ImagesToPdf passed over
    pub skipped: Vec<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartResult {
    pub filename: String,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
    pub processing_time_ms: u64,
}

struct Produced {
    outputs: Vec<(String, Result<Vec<u8>, PdfKitError>)>,
    skipped: Vec<String>,
    /// Outputs are reported as `parts` rather than `data`
    multi: bool,
}

impl Produced {
    fn single(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            outputs: vec![(name.to_string(), Ok(bytes))],
            skipped: Vec::new(),
            multi: false,
        }
    }
}

/// Run a command and package its outcome
pub fn execute(command: PdfCommand) -> ProcessResult {
    let started = Instant::now();
    let input_size = command.input_size();
    let name = command.name();
    debug!(command = name, input_size, "executing");

    match run(command) {
        Ok(produced) => {
            let mut output_size = 0;
            let mut page_count = 0;
            let mut parts = Vec::new();
            let mut data = None;

            for (filename, result) in produced.outputs {
                match result {
                    Ok(bytes) => {
                        output_size += bytes.len();
                        page_count += get_page_count(&bytes).unwrap_or(0);
                        let encoded = STANDARD.encode(&bytes);
                        if produced.multi {
                            parts.push(PartResult {
                                filename,
                                data: Some(encoded),
                                error: None,
                            });
                        } else {
                            data = Some(encoded);
                        }
                    }
                    Err(e) => parts.push(PartResult {
                        filename,
                        data: None,
                        error: Some(e.to_string()),
                    }),
                }
            }

            ProcessResult {
                success: true,
                data,
                parts,
                skipped: produced.skipped,
                error: None,
                metrics: Some(ProcessMetrics {
                    input_size_bytes: input_size,
                    output_size_bytes: output_size,
                    page_count,
                    processing_time_ms: started.elapsed().as_millis() as u64,
                }),
            }
        }
        Err(e) => {
            error!(command = name, %e, "command failed");
            ProcessResult {
                success: false,
                data: None,
                parts: Vec::new(),
                skipped: Vec::new(),
                error: Some(e.to_string()),
                metrics: None,
            }
        }
    }
}

fn run(command: PdfCommand) -> Result<Produced, PdfKitError> {
    Ok(match command {
        PdfCommand::Merge { files } => Produced::single(MERGED_NAME, merge_documents(files)?),
        PdfCommand::Split { file, ranges } => Produced {
            outputs: extract_ranges(&file, &ranges)?
                .into_iter()
                .enumerate()
                .map(|(i, result)| (split_name(i + 1), result))
                .collect(),
            skipped: Vec::new(),
            multi: true,
        },
        PdfCommand::Rotate { file, degrees } => {
            Produced::single(ROTATED_NAME, rotate_pages(&file, degrees)?)
        }
        PdfCommand::DeletePages { file, pages } => {
            Produced::single(PAGES_REMOVED_NAME, delete_pages(&file, &pages)?)
        }
        PdfCommand::AddText { file, overlay } => {
            Produced::single(WITH_TEXT_NAME, add_text(&file, &overlay)?)
        }
        PdfCommand::Compress { file, options } => {
            Produced::single(COMPRESSED_NAME, compress_with(&file, &options)?)
        }
        PdfCommand::ImagesToPdf { files } => {
            let result = images_to_pdf(&files)?;
            Produced {
                skipped: result.skipped,
                ..Produced::single(IMAGES_NAME, result.bytes)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_test_pdf;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_deserializes_merge() {
        let json = r#"{"type":"Merge","files":[]}"#;
        let cmd: PdfCommand = serde_json::from_str(json).unwrap();
        assert!(matches!(cmd, PdfCommand::Merge { .. }));
    }

    #[test]
    fn test_command_deserializes_split() {
        let json = r#"{"type":"Split","file":[],"ranges":[{"start":0,"end":2},{"start":4,"end":4}]}"#;
        let cmd: PdfCommand = serde_json::from_str(json).unwrap();
        let PdfCommand::Split { ranges, .. } = cmd else {
            panic!("expected Split");
        };
        assert_eq!(ranges, vec![PageRange::new(0, 2), PageRange::single(4)]);
    }

    #[test]
    fn test_rotate_rejects_non_quarter_turns() {
        let json = r#"{"type":"Rotate","file":[],"degrees":45}"#;
        assert!(serde_json::from_str::<PdfCommand>(json).is_err());
        let json = r#"{"type":"Rotate","file":[],"degrees":270}"#;
        assert!(serde_json::from_str::<PdfCommand>(json).is_ok());
    }

    #[test]
    fn test_execute_merge_reports_metrics() {
        let files = vec![create_test_pdf(2, "A"), create_test_pdf(1, "B")];
        let result = execute(PdfCommand::Merge { files });

        assert!(result.success);
        let bytes = STANDARD.decode(result.data.unwrap()).unwrap();
        assert_eq!(get_page_count(&bytes).unwrap(), 3);
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.page_count, 3);
        assert_eq!(metrics.output_size_bytes, bytes.len());
    }

    #[test]
    fn test_execute_split_keeps_per_range_errors() {
        let file = create_test_pdf(3, "S");
        let result = execute(PdfCommand::Split {
            file,
            ranges: vec![PageRange::single(0), PageRange::new(1, 9)],
        });

        assert!(result.success);
        assert_eq!(result.parts.len(), 2);
        assert_eq!(result.parts[0].filename, "split-1.pdf");
        assert!(result.parts[0].data.is_some());
        assert!(result.parts[1].error.is_some());
    }

    #[test]
    fn test_execute_failure_carries_message() {
        let result = execute(PdfCommand::DeletePages {
            file: create_test_pdf(2, "D"),
            pages: vec![5],
        });
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Page index 5"));
        assert!(result.metrics.is_none());
    }
}
