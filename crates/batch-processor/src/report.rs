//! Per-item outcomes and the batch summary built from them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vmap_common::{Dimensions, FeatureVector, ProcessingError, SpaceCategory};
use vmap_feature_classifier::{ClassificationResult, Descriptors, ImageHash};

/// Summary of one successfully classified image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub filename: String,
    pub category: SpaceCategory,
    pub confidence: f64,
    pub description: String,
    pub features: FeatureVector,
    pub notes: Vec<String>,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    /// `seq_NNN-NNN` block of the record's sequence number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ImageHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dominant_colors: Vec<[u8; 3]>,
}

impl ClassificationRecord {
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        result: ClassificationResult,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            filename: filename.into(),
            category: result.category,
            confidence: result.confidence,
            description: result.category.description().to_string(),
            features: result.features,
            notes: result.notes,
            dimensions,
            suggested_name: None,
            sequence_group: None,
            file_size: None,
            hash: None,
            corner_count: None,
            dominant_colors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_descriptors(mut self, descriptors: Descriptors) -> Self {
        self.hash = Some(descriptors.hash);
        self.corner_count = Some(descriptors.corner_count);
        self.dominant_colors = descriptors.dominant_colors;
        self
    }

    /// Name the file ends up with: the suggested name when renaming, else the original
    #[must_use]
    pub fn output_name(&self) -> &str {
        self.suggested_name.as_deref().unwrap_or(&self.filename)
    }
}

/// Why one item could not be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub filename: String,
    /// Stable tag from [`ProcessingError::kind`]
    pub kind: String,
    pub message: String,
}

impl ItemError {
    #[must_use]
    pub fn from_error(filename: impl Into<String>, error: &ProcessingError) -> Self {
        Self {
            filename: filename.into(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result slot for one batch item, in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    Classified(ClassificationRecord),
    Failed(ItemError),
    Cancelled { filename: String },
}

impl ItemOutcome {
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            ItemOutcome::Classified(record) => &record.filename,
            ItemOutcome::Failed(error) => &error.filename,
            ItemOutcome::Cancelled { filename } => filename,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<&ClassificationRecord> {
        match self {
            ItemOutcome::Classified(record) => Some(record),
            _ => None,
        }
    }
}

/// Aggregate counts and records for a whole batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub cancelled: usize,
    /// Count per category name, sorted by name
    pub categories: BTreeMap<String, usize>,
    pub files: Vec<ClassificationRecord>,
    pub failures: Vec<ItemError>,
    /// Output names per sequence group, in input order within a group
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sequence_groups: BTreeMap<String, Vec<String>>,
}

impl BatchReport {
    /// Fold ordered outcomes into a report; `processed + errors + cancelled == total`
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let mut report = BatchReport {
            total: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                ItemOutcome::Classified(record) => {
                    report.processed += 1;
                    *report
                        .categories
                        .entry(record.category.as_str().to_string())
                        .or_insert(0) += 1;
                    if let Some(group) = &record.sequence_group {
                        report
                            .sequence_groups
                            .entry(group.clone())
                            .or_default()
                            .push(record.output_name().to_string());
                    }
                    report.files.push(record);
                }
                ItemOutcome::Failed(error) => {
                    report.errors += 1;
                    report.failures.push(error);
                }
                ItemOutcome::Cancelled { .. } => report.cancelled += 1,
            }
        }
        report
    }

    /// # Errors
    /// Returns [`ProcessingError::Serialization`] if encoding fails
    pub fn to_json_pretty(&self) -> vmap_common::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
