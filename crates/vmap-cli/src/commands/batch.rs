//! Directory batch classification

use super::load_config;
use crate::discovery::find_images;
use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use vmap_batch::{BatchProcessor, BatchReport, FileImageSource, ItemOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Jsonl,
}

#[derive(Args)]
pub struct BatchCommand {
    /// Directory containing jpg/jpeg/png/bmp images
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Write the batch summary JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suggest descriptive file names for classified images
    #[arg(long)]
    rename: bool,

    /// Group classified images into seq_NNN-NNN blocks by sequence number
    #[arg(long)]
    organize: bool,

    /// Process images one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Per-item output: text log lines or JSON lines on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl BatchCommand {
    pub fn execute(self) -> Result<()> {
        info!("=== VMAP Batch ===");

        let mut config = load_config(self.config.as_deref())?;
        if self.rename {
            config.rename = true;
        }
        if self.organize {
            config.organize = true;
        }
        if self.sequential {
            config.parallel = false;
        }

        let images = find_images(&self.input_dir)?;
        if images.is_empty() {
            anyhow::bail!("No images found in {}", self.input_dir.display());
        }
        info!("Found {} images to process", images.len());

        let sources: Vec<FileImageSource> = images.into_iter().map(FileImageSource::new).collect();
        let processor = BatchProcessor::new(config).context("Invalid configuration")?;
        let outcomes = processor.process(&sources);

        let total = outcomes.len();
        for (i, outcome) in outcomes.iter().enumerate() {
            self.print_outcome(i + 1, total, outcome);
        }

        let report = BatchReport::from_outcomes(outcomes);
        self.print_summary(&report);

        if let Some(output) = &self.output {
            let json = report.to_json_pretty().context("Failed to encode summary")?;
            std::fs::write(output, json)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Processing summary saved to: {}", output.display());
        }

        Ok(())
    }

    fn print_outcome(&self, position: usize, total: usize, outcome: &ItemOutcome) {
        if self.format == OutputFormat::Jsonl {
            let line = match outcome {
                ItemOutcome::Classified(record) => serde_json::json!({
                    "type": "success",
                    "file": record.filename,
                    "category": record.category,
                    "confidence": record.confidence,
                    "suggested_name": record.suggested_name,
                    "sequence_group": record.sequence_group,
                    "hash": record.hash,
                }),
                ItemOutcome::Failed(error) => serde_json::json!({
                    "type": "error",
                    "file": error.filename,
                    "kind": error.kind,
                    "error": error.message,
                }),
                ItemOutcome::Cancelled { filename } => serde_json::json!({
                    "type": "cancelled",
                    "file": filename,
                }),
            };
            println!("{line}");
            return;
        }

        match outcome {
            ItemOutcome::Classified(record) => match &record.suggested_name {
                Some(name) => info!(
                    "✓ [{}/{}] {} - {} ({:.2}) -> {}",
                    position, total, record.filename, record.category, record.confidence, name
                ),
                None => info!(
                    "✓ [{}/{}] {} - {} ({:.2})",
                    position, total, record.filename, record.category, record.confidence
                ),
            },
            ItemOutcome::Failed(error) => warn!(
                "✗ [{}/{}] {} - FAILED: {}",
                position, total, error.filename, error.message
            ),
            ItemOutcome::Cancelled { filename } => {
                warn!("- [{}/{}] {} - cancelled", position, total, filename);
            }
        }
    }

    fn print_summary(&self, report: &BatchReport) {
        if self.format == OutputFormat::Jsonl {
            println!(
                "{}",
                serde_json::json!({
                    "type": "summary",
                    "total": report.total,
                    "processed": report.processed,
                    "errors": report.errors,
                    "cancelled": report.cancelled,
                    "categories": report.categories,
                    "sequence_groups": report.sequence_groups,
                })
            );
            return;
        }

        info!("=== Processing Complete ===");
        info!("Total images: {}", report.total);
        info!("Processed: {}", report.processed);
        info!("Errors: {}", report.errors);
        if report.cancelled > 0 {
            info!("Cancelled: {}", report.cancelled);
        }
        info!("Categories:");
        for (category, count) in &report.categories {
            info!("  {}: {}", category, count);
        }
        if !report.sequence_groups.is_empty() {
            info!("Sequence groups:");
            for (group, names) in &report.sequence_groups {
                info!("  {}: {} images", group, names.len());
            }
        }
    }
}
