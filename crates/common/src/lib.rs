/// Common types and utilities for panoramic survey processing
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Processing errors
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProcessingError {
    /// Stable tag used when recording an error in a batch report
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessingError::Decode(_) => "decode",
            ProcessingError::DegenerateInput(_) => "degenerate_input",
            ProcessingError::Configuration(_) => "configuration",
            ProcessingError::Io(_) => "io",
            ProcessingError::Serialization(_) => "serialization",
        }
    }
}

impl From<image::ImageError> for ProcessingError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => ProcessingError::Io(io),
            other => ProcessingError::Decode(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ProcessingError {
    fn from(err: serde_json::Error) -> Self {
        ProcessingError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ProcessingError {
    fn from(err: serde_yaml::Error) -> Self {
        ProcessingError::Configuration(err.to_string())
    }
}

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Spatial context label assigned to a photograph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceCategory {
    Hallway,
    Classroom,
    Doorway,
    Stairwell,
    CommonArea,
    Office,
    Lab,
    Unknown,
}

impl SpaceCategory {
    /// Number of categories, including `Unknown`
    pub const COUNT: usize = 8;

    /// Every category, in declaration order
    pub const ALL: [SpaceCategory; Self::COUNT] = [
        SpaceCategory::Hallway,
        SpaceCategory::Classroom,
        SpaceCategory::Doorway,
        SpaceCategory::Stairwell,
        SpaceCategory::CommonArea,
        SpaceCategory::Office,
        SpaceCategory::Lab,
        SpaceCategory::Unknown,
    ];

    /// Position of this category in [`SpaceCategory::ALL`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SpaceCategory::Hallway => "hallway",
            SpaceCategory::Classroom => "classroom",
            SpaceCategory::Doorway => "doorway",
            SpaceCategory::Stairwell => "stairwell",
            SpaceCategory::CommonArea => "common_area",
            SpaceCategory::Office => "office",
            SpaceCategory::Lab => "lab",
            SpaceCategory::Unknown => "unknown",
        }
    }

    /// Human-readable description of the space
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            SpaceCategory::Hallway => "Long corridor or hallway",
            SpaceCategory::Classroom => "Classroom or learning space",
            SpaceCategory::Doorway => "Entrance or doorway",
            SpaceCategory::Stairwell => "Staircase or stairwell",
            SpaceCategory::CommonArea => "Common area or open space",
            SpaceCategory::Office => "Office or administrative space",
            SpaceCategory::Lab => "Laboratory or technical space",
            SpaceCategory::Unknown => "Unclassified space",
        }
    }
}

impl fmt::Display for SpaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceCategory {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        SpaceCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProcessingError::Configuration(format!("Unknown category: {s}")))
    }
}

/// Fixed-schema numeric summary of one image
///
/// Every field is derived from the same decoded image and the same grayscale field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Fraction of pixels flagged as edges, in [0, 1]
    pub edge_density: f64,
    pub line_count: u32,
    /// Segments within 80-100 degrees of horizontal
    #[serde(alias = "vertical_lines")]
    pub vertical_line_count: u32,
    /// Segments below 10 or above 170 degrees
    #[serde(alias = "horizontal_lines")]
    pub horizontal_line_count: u32,
    pub door_count: u32,
    /// Mean luminance (0-255)
    pub brightness: f64,
    /// Population standard deviation of luminance
    pub contrast: f64,
    /// Left/mirrored-right normalized cross-correlation, in [-1, 1]
    pub symmetry: f64,
    /// Mean HSV saturation (0-255)
    pub saturation: f64,
    /// Mean HSV value (0-255)
    pub value: f64,
}

/// Pixel dimensions of a decoded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}
