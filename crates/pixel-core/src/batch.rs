//! Sequential, order-preserving batch removal over many images.
//!
//! Items are awaited one after another so only one decoded bitmap is
//! resident at a time, and results line up with inputs index for index.
//! A failing item is recorded and the batch moves on.

use serde::{Deserialize, Serialize};
use shared_types::{InputFile, OutputFile};
use tracing::{debug, info, warn};

use crate::codec::{self, EncodeOptions};
use crate::error::PixelError;
use crate::fill::{fill_with, FillOptions};
use crate::region::Region;
use crate::removal::output_name;

/// What to fill in one batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selection {
    /// No region drawn for this item; it passes through re-encoded
    WholeFrame,
    Region(Region),
}

impl Selection {
    pub fn region(&self) -> Region {
        match self {
            Selection::WholeFrame => Region::EMPTY,
            Selection::Region(region) => *region,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub file: InputFile,
    pub selection: Selection,
}

impl BatchItem {
    pub fn new(file: InputFile, selection: Selection) -> Self {
        Self { file, selection }
    }

    pub fn whole_frame(file: InputFile) -> Self {
        Self::new(file, Selection::WholeFrame)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Success(OutputFile),
    Failure { name: String, reason: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

impl BatchProgress {
    /// Completion in percent; 100 only once every item has resolved
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchPipeline {
    fill: FillOptions,
    encode: EncodeOptions,
}

impl BatchPipeline {
    pub fn new(fill: FillOptions, encode: EncodeOptions) -> Self {
        Self { fill, encode }
    }

    /// Process `items` in order, reporting progress after each one
    pub async fn run<F>(&self, items: Vec<BatchItem>, mut on_progress: F) -> Vec<ItemOutcome>
    where
        F: FnMut(BatchProgress),
    {
        let total = items.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, item) in items.into_iter().enumerate() {
            tokio::task::yield_now().await;

            let outcome = match self.process(&item) {
                Ok(output) => {
                    debug!(index, file = %item.file.name, "Batch item done");
                    ItemOutcome::Success(output)
                }
                Err(e) => {
                    warn!(index, file = %item.file.name, error = %e, "Batch item failed");
                    ItemOutcome::Failure {
                        name: item.file.name.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);

            on_progress(BatchProgress {
                completed: index + 1,
                total,
            });
        }

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        info!(total, succeeded, "Batch finished");
        outcomes
    }

    /// Apply the same selection to every file
    pub async fn run_uniform<F>(
        &self,
        files: Vec<InputFile>,
        selection: Selection,
        on_progress: F,
    ) -> Vec<ItemOutcome>
    where
        F: FnMut(BatchProgress),
    {
        let items = files
            .into_iter()
            .map(|file| BatchItem::new(file, selection))
            .collect();
        self.run(items, on_progress).await
    }

    fn process(&self, item: &BatchItem) -> Result<OutputFile, PixelError> {
        let decoded = codec::decode(&item.file.bytes)?;
        let filled = fill_with(&decoded.bitmap, item.selection.region(), &self.fill);
        let bytes = codec::encode(&filled, decoded.format, &self.encode)?;
        Ok(OutputFile::new(output_name(&item.file.name), decoded.format, bytes))
    }
}
