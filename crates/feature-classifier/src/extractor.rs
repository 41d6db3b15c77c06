//! Feature extraction: one decoded RGB image in, one [`FeatureVector`] out

use crate::edges::detect_edges;
use crate::geometry::{
    approximate_closed_polygon, bounding_rect, classify_angle, field_stats, is_door_shaped,
    luminance, normalized_cross_correlation, saturation_value, segment_angle_degrees,
    LineOrientation,
};
use crate::hough::{detect_segments, HoughParams, LineSegment};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::contours::find_contours;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vmap_common::{FeatureVector, ProcessingError, Result};

/// Tunable constants of the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Hysteresis low threshold on gradient magnitude (0-255 scale)
    pub canny_low: f32,
    /// Hysteresis high threshold on gradient magnitude (0-255 scale)
    pub canny_high: f32,
    /// Probabilistic line detection parameters
    pub hough: HoughParams,
    /// Polygon approximation tolerance as a fraction of contour perimeter
    pub approx_epsilon_ratio: f64,
    /// Exclusive lower bound on door width/height
    pub door_aspect_min: f64,
    /// Exclusive upper bound on door width/height
    pub door_aspect_max: f64,
    /// Door bounding boxes must cover strictly more pixels than this
    pub min_door_area: i64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough: HoughParams::default(),
            approx_epsilon_ratio: 0.02,
            door_aspect_min: 0.3,
            door_aspect_max: 0.7,
            min_door_area: 5000,
        }
    }
}

impl ExtractorConfig {
    /// Check the configuration for values the pipeline cannot run with
    ///
    /// # Errors
    /// Returns [`ProcessingError::Configuration`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if !(self.canny_low > 0.0 && self.canny_high >= self.canny_low) {
            return Err(ProcessingError::Configuration(format!(
                "canny thresholds must satisfy 0 < low <= high (low={}, high={})",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio.is_finite()) {
            return Err(ProcessingError::Configuration(format!(
                "approx_epsilon_ratio must be positive, got {}",
                self.approx_epsilon_ratio
            )));
        }
        if i32::try_from(self.hough.threshold).is_err() {
            return Err(ProcessingError::Configuration(format!(
                "hough.threshold is too large: {}",
                self.hough.threshold
            )));
        }
        if self.hough.min_line_length == 0 {
            return Err(ProcessingError::Configuration(
                "hough.min_line_length must be at least 1".to_string(),
            ));
        }
        if self.door_aspect_min >= self.door_aspect_max {
            return Err(ProcessingError::Configuration(format!(
                "door aspect range is empty: ({}, {})",
                self.door_aspect_min, self.door_aspect_max
            )));
        }
        Ok(())
    }
}

/// Computes [`FeatureVector`]s from decoded images
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    /// Create an extractor after validating its configuration
    ///
    /// # Errors
    /// Returns [`ProcessingError::Configuration`] if the configuration is invalid
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract features from any decoded image
    ///
    /// # Errors
    /// See [`FeatureExtractor::extract`]
    pub fn extract_dynamic(&self, image: &DynamicImage) -> Result<FeatureVector> {
        self.extract(&image.to_rgb8())
    }

    /// Extract the full feature vector from an RGB image
    ///
    /// # Errors
    /// Returns [`ProcessingError::DegenerateInput`] for an image with zero width or height
    pub fn extract(&self, image: &RgbImage) -> Result<FeatureVector> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ProcessingError::DegenerateInput(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let gray = to_grayscale(image);
        let edges = detect_edges(&gray, self.config.canny_low, self.config.canny_high);

        let total_pixels = f64::from(width) * f64::from(height);
        let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
        let edge_density = edge_pixels as f64 / total_pixels;

        let segments = detect_segments(&edges, &self.config.hough);
        let (vertical_line_count, horizontal_line_count) = count_orientations(&segments);

        let door_count = self.count_door_candidates(&edges);

        let luma = field_stats(gray.pixels().map(|p| p[0]));
        let symmetry = symmetry_score(&gray);
        let (saturation, value) = mean_saturation_value(image);

        debug!(
            "Features {}x{}: edges={:.3}, lines={} (v={}, h={}), doors={}",
            width,
            height,
            edge_density,
            segments.len(),
            vertical_line_count,
            horizontal_line_count,
            door_count
        );
        debug!(
            "Features {}x{}: brightness={:.1}, contrast={:.1}, symmetry={:.3}",
            width, height, luma.mean, luma.std_dev, symmetry
        );

        Ok(FeatureVector {
            edge_density,
            line_count: segments.len() as u32,
            vertical_line_count,
            horizontal_line_count,
            door_count,
            brightness: luma.mean,
            contrast: luma.std_dev,
            symmetry,
            saturation,
            value,
        })
    }

    /// Count 4-vertex contour approximations whose bounding box looks like a door
    fn count_door_candidates(&self, edges: &GrayImage) -> u32 {
        let contours = find_contours::<i32>(edges);
        let mut doors = 0;
        for contour in &contours {
            let polygon =
                approximate_closed_polygon(&contour.points, self.config.approx_epsilon_ratio);
            if polygon.len() != 4 {
                continue;
            }
            let Some(bbox) = bounding_rect(&polygon) else {
                continue;
            };
            if is_door_shaped(
                &bbox,
                self.config.door_aspect_min,
                self.config.door_aspect_max,
                self.config.min_door_area,
            ) {
                doors += 1;
            }
        }
        doors
    }
}

/// Luminance field of an RGB image
#[must_use]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        Luma([luminance(r, g, b)])
    })
}

fn count_orientations(segments: &[LineSegment]) -> (u32, u32) {
    let mut vertical = 0;
    let mut horizontal = 0;
    for seg in segments {
        match classify_angle(segment_angle_degrees(seg.start, seg.end)) {
            LineOrientation::Vertical => vertical += 1,
            LineOrientation::Horizontal => horizontal += 1,
            LineOrientation::Oblique => {}
        }
    }
    (vertical, horizontal)
}

/// Correlation between the left half and the mirrored right half of the field
///
/// Both halves are cropped to the narrower width, never less than one column.
#[must_use]
pub fn symmetry_score(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    let half = width / 2;
    let crop = half.min(width - half).max(1);

    let capacity = (crop * height) as usize;
    let mut left = Vec::with_capacity(capacity);
    let mut right = Vec::with_capacity(capacity);
    for y in 0..height {
        for c in 0..crop {
            left.push(f64::from(gray.get_pixel(c, y)[0]));
            right.push(f64::from(gray.get_pixel(width - 1 - c, y)[0]));
        }
    }
    normalized_cross_correlation(&left, &right)
}

fn mean_saturation_value(image: &RgbImage) -> (f64, f64) {
    let mut sat_sum: u64 = 0;
    let mut val_sum: u64 = 0;
    for pixel in image.pixels() {
        let [r, g, b] = pixel.0;
        let (s, v) = saturation_value(r, g, b);
        sat_sum += u64::from(s);
        val_sum += u64::from(v);
    }
    let n = f64::from(image.width()) * f64::from(image.height());
    if n == 0.0 {
        return (0.0, 0.0);
    }
    (sat_sum as f64 / n, val_sum as f64 / n)
}
