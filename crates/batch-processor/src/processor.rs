//! Batch loop: classify every source, keep going past failures, preserve order

use crate::config::VmapConfig;
use crate::naming::{descriptive_filename, extract_sequence, sequence_group};
use crate::report::{BatchReport, ClassificationRecord, ItemError, ItemOutcome};
use crate::source::ImageSource;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use vmap_common::{Dimensions, Result};
use vmap_feature_classifier::{describe, extract_and_classify, FeatureExtractor};
use vmap_floor_plan::{export_layout, LayoutExport};

/// Runs classification over a batch of [`ImageSource`]s
pub struct BatchProcessor {
    extractor: FeatureExtractor,
    config: VmapConfig,
    rename_date: NaiveDate,
    cancel: Arc<AtomicBool>,
}

impl BatchProcessor {
    /// # Errors
    /// Returns [`vmap_common::ProcessingError::Configuration`] if `config` is invalid
    pub fn new(config: VmapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.extractor.clone())?,
            config,
            rename_date: chrono::Local::now().date_naive(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Date stamped into descriptive file names (defaults to today)
    #[must_use]
    pub fn with_rename_date(mut self, date: NaiveDate) -> Self {
        self.rename_date = date;
        self
    }

    /// Share an externally owned cancellation flag
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setting this flag stops new items from starting; they are reported as cancelled
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    #[must_use]
    pub fn config(&self) -> &VmapConfig {
        &self.config
    }

    /// Decode and classify one source; never fails, errors become [`ItemOutcome::Failed`]
    pub fn process_item<S: ImageSource + ?Sized>(&self, source: &S) -> ItemOutcome {
        let filename = source.id().to_string();
        if self.cancel.load(Ordering::Relaxed) {
            return ItemOutcome::Cancelled { filename };
        }

        let result = source.decode().and_then(|image| {
            let (width, height) = image.dimensions();
            let result = extract_and_classify(&self.extractor, &image)?;
            let descriptors = if self.config.descriptors.enabled {
                Some(describe(&image, &self.config.descriptors)?)
            } else {
                None
            };
            Ok((result, descriptors, Dimensions { width, height }))
        });

        match result {
            Ok((result, descriptors, dimensions)) => {
                debug!("{}: {} ({:.2})", filename, result.category, result.confidence);
                let mut record = ClassificationRecord::new(filename, result, dimensions);
                if let Some(descriptors) = descriptors {
                    record = record.with_descriptors(descriptors);
                }
                record.file_size = source.file_size();
                if self.config.rename {
                    record.suggested_name = Some(descriptive_filename(
                        &record.filename,
                        record.category,
                        self.rename_date,
                    ));
                }
                if self.config.organize {
                    record.sequence_group =
                        extract_sequence(record.output_name()).map(sequence_group);
                }
                ItemOutcome::Classified(record)
            }
            Err(e) => {
                warn!("Error processing {}: {}", filename, e);
                ItemOutcome::Failed(ItemError::from_error(filename, &e))
            }
        }
    }

    /// Process every source; the returned outcomes are in input order
    pub fn process<S: ImageSource>(&self, sources: &[S]) -> Vec<ItemOutcome> {
        let start = Instant::now();
        info!(
            "Processing {} images ({})",
            sources.len(),
            if self.config.parallel {
                "parallel"
            } else {
                "sequential"
            }
        );

        let outcomes: Vec<ItemOutcome> = if self.config.parallel {
            sources.par_iter().map(|s| self.process_item(s)).collect()
        } else {
            sources.iter().map(|s| self.process_item(s)).collect()
        };

        info!(
            "Processed {} images in {:.2}s",
            outcomes.len(),
            start.elapsed().as_secs_f64()
        );
        outcomes
    }

    /// Process every source and summarize
    pub fn run<S: ImageSource>(&self, sources: &[S]) -> BatchReport {
        let report = BatchReport::from_outcomes(self.process(sources));
        info!(
            "Batch complete: {} processed, {} errors, {} cancelled",
            report.processed, report.errors, report.cancelled
        );
        report
    }

    /// Lay out the batch in input order using the configured strategy and site labels
    ///
    /// # Errors
    /// Returns [`vmap_common::ProcessingError::Configuration`] if the layout configuration is
    /// invalid
    pub fn export_layout<S: ImageSource>(&self, sources: &[S]) -> Result<LayoutExport> {
        let ids: Vec<&str> = sources.iter().map(|s| s.id()).collect();
        export_layout(
            &ids,
            self.config.strategy,
            &self.config.layout,
            &self.config.site,
        )
    }
}
