//! Image descriptors reported next to the classification
//!
//! - Average hash: 8x8 Lanczos downscale of the luminance field, one bit per cell that is
//!   brighter than the mean, row-major with the first cell in the most significant bit.
//! - Corner count: minimum-eigenvalue (Shi-Tomasi) corners over a 3x3 structure tensor,
//!   kept when above `corner_quality` times the strongest response, strongest first, at
//!   least `corner_min_distance` apart.
//! - Dominant colors: seeded k-means over the RGB pixels, best of several restarts, most
//!   populated cluster first.
//!
//! None of these feed the rule scorer.

use crate::extractor::to_grayscale;
use image::imageops::{resize, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vmap_common::{ProcessingError, Result};

const HASH_SIDE: u32 = 8;

/// Descriptor settings; the defaults mirror the survey analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Compute descriptors at all during batch runs
    pub enabled: bool,
    /// Upper bound on reported corners, 0 for no limit
    pub max_corners: u32,
    /// Fraction of the strongest corner response a corner must exceed
    pub corner_quality: f64,
    /// Minimum Euclidean distance between two reported corners, in pixels
    pub corner_min_distance: f64,
    pub color_clusters: usize,
    /// Independent k-means restarts; the most compact one is kept
    pub kmeans_attempts: u32,
    pub kmeans_max_iterations: u32,
    /// Stop once no center moves further than this (0-255 RGB units)
    pub kmeans_epsilon: f64,
    /// Pixels are sampled with a fixed stride down to at most this many
    pub color_sample_limit: usize,
    pub seed: u64,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_corners: 100,
            corner_quality: 0.01,
            corner_min_distance: 10.0,
            color_clusters: 3,
            kmeans_attempts: 10,
            kmeans_max_iterations: 100,
            kmeans_epsilon: 0.2,
            color_sample_limit: 20_000,
            seed: 0x00c0_1045,
        }
    }
}

impl DescriptorConfig {
    /// # Errors
    /// Returns [`ProcessingError::Configuration`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if !(self.corner_quality > 0.0 && self.corner_quality <= 1.0) {
            return Err(ProcessingError::Configuration(format!(
                "corner_quality must be in (0, 1], got {}",
                self.corner_quality
            )));
        }
        if !(self.corner_min_distance >= 0.0 && self.corner_min_distance.is_finite()) {
            return Err(ProcessingError::Configuration(format!(
                "corner_min_distance must be non-negative, got {}",
                self.corner_min_distance
            )));
        }
        if self.color_clusters == 0 || self.kmeans_attempts == 0 || self.color_sample_limit == 0 {
            return Err(ProcessingError::Configuration(
                "color_clusters, kmeans_attempts and color_sample_limit must be at least 1"
                    .to_string(),
            ));
        }
        if !(self.kmeans_epsilon >= 0.0 && self.kmeans_epsilon.is_finite()) {
            return Err(ProcessingError::Configuration(format!(
                "kmeans_epsilon must be non-negative, got {}",
                self.kmeans_epsilon
            )));
        }
        Ok(())
    }
}

/// 64-bit average hash, written as 16 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ImageHash(pub u64);

impl ImageHash {
    /// Number of differing bits; near-duplicates stay within a few bits
    #[must_use]
    pub fn hamming_distance(self, other: ImageHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ImageHash {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 16 {
            return Err(ProcessingError::Serialization(format!(
                "image hash must be 16 hex digits: {s:?}"
            )));
        }
        u64::from_str_radix(s, 16)
            .map(ImageHash)
            .map_err(|e| ProcessingError::Serialization(format!("invalid image hash {s:?}: {e}")))
    }
}

impl From<ImageHash> for String {
    fn from(hash: ImageHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for ImageHash {
    type Error = ProcessingError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Descriptors of one decoded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptors {
    pub hash: ImageHash,
    pub corner_count: u32,
    /// RGB cluster centers, most populated first
    pub dominant_colors: Vec<[u8; 3]>,
}

/// Compute every descriptor of an RGB image
///
/// # Errors
/// Returns [`ProcessingError::DegenerateInput`] for an image without pixels
pub fn describe(image: &RgbImage, config: &DescriptorConfig) -> Result<Descriptors> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::DegenerateInput(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    let gray = to_grayscale(image);
    Ok(Descriptors {
        hash: average_hash(&gray),
        corner_count: count_corners(&gray, config),
        dominant_colors: dominant_colors(image, config),
    })
}

/// Average hash of a luminance field
#[must_use]
pub fn average_hash(gray: &GrayImage) -> ImageHash {
    let small = resize(gray, HASH_SIDE, HASH_SIDE, FilterType::Lanczos3);
    let mean = small.pixels().map(|p| f64::from(p[0])).sum::<f64>()
        / f64::from(HASH_SIDE * HASH_SIDE);
    let bits = small.pixels().fold(0u64, |acc, p| {
        let bright = f64::from(p[0]) > mean;
        (acc << 1) | u64::from(bright)
    });
    ImageHash(bits)
}

/// Minimum eigenvalue of the gradient structure tensor summed over each 3x3 block
fn min_eigenvalues(gray: &GrayImage) -> Vec<f64> {
    let (width, height) = gray.dimensions();
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let len = (width as usize) * (height as usize);
    let mut xx = vec![0i64; len];
    let mut xy = vec![0i64; len];
    let mut yy = vec![0i64; len];
    for (i, (dx, dy)) in gx.pixels().zip(gy.pixels()).enumerate() {
        let (dx, dy) = (i64::from(dx[0]), i64::from(dy[0]));
        xx[i] = dx * dx;
        xy[i] = dx * dy;
        yy[i] = dy * dy;
    }

    let w = i64::from(width);
    let h = i64::from(height);
    let mut eig = vec![0.0; len];
    for y in 0..h {
        for x in 0..w {
            let (mut a, mut b, mut c) = (0i64, 0i64, 0i64);
            for oy in -1..=1 {
                for ox in -1..=1 {
                    let nx = (x + ox).clamp(0, w - 1);
                    let ny = (y + oy).clamp(0, h - 1);
                    let j = (ny * w + nx) as usize;
                    a += xx[j];
                    b += xy[j];
                    c += yy[j];
                }
            }
            let (a, b, c) = (a as f64, b as f64, c as f64);
            let half_diff = (a - c) / 2.0;
            eig[(y * w + x) as usize] = (a + c) / 2.0 - (half_diff * half_diff + b * b).sqrt();
        }
    }
    eig
}

/// Number of well-separated strong corners
#[must_use]
pub fn count_corners(gray: &GrayImage, config: &DescriptorConfig) -> u32 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0;
    }
    let eig = min_eigenvalues(gray);
    let max = eig.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return 0;
    }
    let threshold = max * config.corner_quality;

    let w = width as usize;
    let mut candidates = Vec::new();
    for y in 1..height as usize - 1 {
        for x in 1..w - 1 {
            let value = eig[y * w + x];
            if value <= threshold {
                continue;
            }
            let is_peak = (y - 1..=y + 1)
                .flat_map(|ny| (x - 1..=x + 1).map(move |nx| ny * w + nx))
                .all(|j| eig[j] <= value);
            if is_peak {
                candidates.push((value, x, y));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let min_distance_sq = config.corner_min_distance * config.corner_min_distance;
    let limit = match config.max_corners {
        0 => usize::MAX,
        n => n as usize,
    };
    let mut kept: Vec<(f64, f64)> = Vec::new();
    for (_, x, y) in candidates {
        if kept.len() >= limit {
            break;
        }
        let (x, y) = (x as f64, y as f64);
        let crowded = kept.iter().any(|&(kx, ky)| {
            let (dx, dy) = (kx - x, ky - y);
            dx * dx + dy * dy < min_distance_sq
        });
        if !crowded {
            kept.push((x, y));
        }
    }
    kept.len() as u32
}

fn distance_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &[f64; 3], centers: &[[f64; 3]]) -> usize {
    centers
        .iter()
        .enumerate()
        .min_by(|a, b| distance_sq(point, a.1).total_cmp(&distance_sq(point, b.1)))
        .map_or(0, |(i, _)| i)
}

struct Clustering {
    centers: Vec<[f64; 3]>,
    labels: Vec<usize>,
    compactness: f64,
}

/// One k-means run from random centers inside the bounding box of the samples
fn kmeans_attempt(
    samples: &[[f64; 3]],
    k: usize,
    config: &DescriptorConfig,
    rng: &mut StdRng,
) -> Clustering {
    let mut low = [f64::MAX; 3];
    let mut high = [f64::MIN; 3];
    for point in samples {
        for ch in 0..3 {
            low[ch] = low[ch].min(point[ch]);
            high[ch] = high[ch].max(point[ch]);
        }
    }
    let mut centers: Vec<[f64; 3]> = (0..k)
        .map(|_| std::array::from_fn(|ch| low[ch] + rng.random::<f64>() * (high[ch] - low[ch])))
        .collect();
    let mut labels = vec![0; samples.len()];
    let epsilon_sq = config.kmeans_epsilon * config.kmeans_epsilon;

    for _ in 0..config.kmeans_max_iterations.max(1) {
        for (label, point) in labels.iter_mut().zip(samples) {
            *label = nearest(point, &centers);
        }

        let mut sums = vec![[0.0; 3]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in samples.iter().zip(&labels) {
            for ch in 0..3 {
                sums[label][ch] += point[ch];
            }
            counts[label] += 1;
        }

        // An empty cluster takes over the sample that sits furthest from its own center.
        for empty in 0..k {
            if counts[empty] > 0 {
                continue;
            }
            let far = (0..samples.len())
                .filter(|&i| counts[labels[i]] > 1)
                .max_by(|&a, &b| {
                    let da = distance_sq(&samples[a], &centers[labels[a]]);
                    let db = distance_sq(&samples[b], &centers[labels[b]]);
                    da.total_cmp(&db)
                });
            if let Some(i) = far {
                let from = labels[i];
                for ch in 0..3 {
                    sums[from][ch] -= samples[i][ch];
                    sums[empty][ch] = samples[i][ch];
                }
                counts[from] -= 1;
                counts[empty] = 1;
                labels[i] = empty;
            }
        }

        let mut max_shift_sq: f64 = 0.0;
        for (center, (sum, &count)) in centers.iter_mut().zip(sums.iter().zip(&counts)) {
            if count == 0 {
                continue;
            }
            let updated = sum.map(|s| s / count as f64);
            max_shift_sq = max_shift_sq.max(distance_sq(center, &updated));
            *center = updated;
        }
        if max_shift_sq <= epsilon_sq {
            break;
        }
    }

    for (label, point) in labels.iter_mut().zip(samples) {
        *label = nearest(point, &centers);
    }
    let compactness = samples
        .iter()
        .zip(&labels)
        .map(|(point, &label)| distance_sq(point, &centers[label]))
        .sum();
    Clustering {
        centers,
        labels,
        compactness,
    }
}

/// Cluster centers of the pixel colors, most populated cluster first
///
/// Clusters left without pixels are dropped, so an image with fewer distinct colors than
/// `color_clusters` reports fewer colors.
#[must_use]
pub fn dominant_colors(image: &RgbImage, config: &DescriptorConfig) -> Vec<[u8; 3]> {
    let pixel_count = image.pixels().len();
    let stride = pixel_count.div_ceil(config.color_sample_limit.max(1)).max(1);
    let samples: Vec<[f64; 3]> = image
        .pixels()
        .step_by(stride)
        .map(|p| p.0.map(f64::from))
        .collect();
    let k = config.color_clusters.min(samples.len());
    if k == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<Clustering> = None;
    for _ in 0..config.kmeans_attempts.max(1) {
        let attempt = kmeans_attempt(&samples, k, config, &mut rng);
        let improves = match &best {
            Some(b) => attempt.compactness < b.compactness,
            None => true,
        };
        if improves {
            best = Some(attempt);
        }
    }
    let Some(best) = best else {
        return Vec::new();
    };

    let mut counts = vec![0usize; k];
    for &label in &best.labels {
        counts[label] += 1;
    }
    let mut order: Vec<usize> = (0..k).filter(|&i| counts[i] > 0).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .map(|i| best.centers[i].map(|c| c.clamp(0.0, 255.0) as u8))
        .collect()
}
