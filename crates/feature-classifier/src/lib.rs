//! Feature Classifier - Classify panoramic photographs by spatial context
//!
//! Turns one decoded image into a fixed [`FeatureVector`] and then into a
//! [`SpaceCategory`] with a confidence score.
//!
//! **Features:**
//! - Edge density from an unsmoothed Canny edge map (hysteresis thresholds 50/150)
//! - Line segments from a probabilistic Hough transform, bucketed vertical/horizontal
//! - Door candidates: 4-vertex contour approximations with door-like proportions
//! - Brightness/contrast, left-right symmetry, HSV saturation/value
//!
//! **Descriptors** (reported, not scored): average hash, corner count, dominant colors.
//!
//! **Classification:** Deterministic rule evaluation (see [`scorer::RULES`]). No trained
//! model is involved, and the label is a heuristic.

pub mod descriptors;
pub mod edges;
pub mod extractor;
pub mod geometry;
pub mod hough;
pub mod scorer;

pub use descriptors::{describe, DescriptorConfig, Descriptors, ImageHash};
pub use extractor::{ExtractorConfig, FeatureExtractor};
pub use hough::{HoughParams, LineSegment};
pub use scorer::{classify, ClassificationResult};
pub use vmap_common::{FeatureVector, SpaceCategory};

use image::RgbImage;
use std::path::Path;
use tracing::{debug, info};
use vmap_common::{ProcessingError, Result};

/// Extract features from a decoded image and classify them
///
/// # Errors
/// Returns [`ProcessingError::DegenerateInput`] for an image without pixels
pub fn extract_and_classify(
    extractor: &FeatureExtractor,
    image: &RgbImage,
) -> Result<ClassificationResult> {
    let features = extractor.extract(image)?;
    let result = classify(&features);
    debug!(
        "Classified as {} (confidence: {:.2})",
        result.category, result.confidence
    );
    Ok(result)
}

/// Decode an image file into RGB pixels
///
/// # Errors
/// Returns [`ProcessingError::Decode`] if the file cannot be decoded, or
/// [`ProcessingError::Io`] if it cannot be read
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => ProcessingError::Io(io),
        other => ProcessingError::Decode(format!("{}: {other}", path.display())),
    })?;
    Ok(img.to_rgb8())
}

/// Classify an image file
///
/// # Errors
/// Propagates decode and extraction errors
pub fn classify_file(extractor: &FeatureExtractor, path: &Path) -> Result<ClassificationResult> {
    info!("Classifying: {}", path.display());
    let image = load_rgb(path)?;
    extract_and_classify(extractor, &image)
}
