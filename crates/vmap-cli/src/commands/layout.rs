//! Floor-plan layout export

use super::load_config;
use crate::discovery::find_images;
use anyhow::{Context as _, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use vmap_batch::{BatchProcessor, FileImageSource};
use vmap_floor_plan::LayoutStrategy;

#[derive(Args)]
pub struct LayoutCommand {
    /// Directory containing the capture sequence
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Placement strategy: auto, linear, serpentine or grid
    #[arg(long)]
    layout: Option<LayoutStrategy>,

    /// Write coordinates and connections to this JSON file instead of stdout
    #[arg(long, value_name = "FILE")]
    export_coords: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl LayoutCommand {
    pub fn execute(self) -> Result<()> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(strategy) = self.layout {
            config.strategy = strategy;
        }

        let images = find_images(&self.input_dir)?;
        info!(
            "Generating {} layout from {} images",
            config.strategy,
            images.len()
        );

        let sources: Vec<FileImageSource> = images.into_iter().map(FileImageSource::new).collect();
        let processor = BatchProcessor::new(config).context("Invalid configuration")?;
        let export = processor
            .export_layout(&sources)
            .context("Layout computation failed")?;
        let json = export.to_json_pretty().context("Failed to encode layout")?;

        match &self.export_coords {
            Some(path) => {
                std::fs::write(path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Coordinates exported to: {}", path.display());
            }
            None => println!("{json}"),
        }
        Ok(())
    }
}
