//! Single-image classification

use super::load_config;
use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use vmap_batch::{BatchProcessor, FileImageSource, ItemOutcome};

#[derive(Args)]
pub struct ClassifyCommand {
    /// Image to classify
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ClassifyCommand {
    pub fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let processor = BatchProcessor::new(config).context("Invalid configuration")?;

        match processor.process_item(&FileImageSource::new(&self.image)) {
            ItemOutcome::Classified(record) => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&record).context("Failed to encode record")?
                );
                Ok(())
            }
            ItemOutcome::Failed(error) => anyhow::bail!(
                "Failed to classify {} ({}): {}",
                self.image.display(),
                error.kind,
                error.message
            ),
            ItemOutcome::Cancelled { filename } => anyhow::bail!("Cancelled: {filename}"),
        }
    }
}
