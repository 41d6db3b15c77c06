//! Placement strategies mapping a capture index to 2-D coordinates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use vmap_common::{ProcessingError, Result};

/// How photographs are arranged on the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Serpentine until path inference from image similarity exists
    #[default]
    Auto,
    Linear,
    Serpentine,
    Grid,
}

impl LayoutStrategy {
    pub const ALL: [LayoutStrategy; 4] = [
        LayoutStrategy::Auto,
        LayoutStrategy::Linear,
        LayoutStrategy::Serpentine,
        LayoutStrategy::Grid,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutStrategy::Auto => "auto",
            LayoutStrategy::Linear => "linear",
            LayoutStrategy::Serpentine => "serpentine",
            LayoutStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutStrategy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        LayoutStrategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ProcessingError::Configuration(format!(
                    "Unknown layout strategy: {s} (expected auto, linear, serpentine or grid)"
                ))
            })
    }
}

/// Layout tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between neighbouring positions (arbitrary units)
    pub spacing: f64,
    /// Positions per row for the serpentine strategy
    pub serpentine_row_width: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: 10.0,
            serpentine_row_width: 10,
        }
    }
}

impl LayoutConfig {
    /// # Errors
    /// Returns [`ProcessingError::Configuration`] for a non-positive spacing or zero row width
    pub fn validate(&self) -> Result<()> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ProcessingError::Configuration(format!(
                "spacing must be a positive number, got {}",
                self.spacing
            )));
        }
        if self.serpentine_row_width == 0 {
            return Err(ProcessingError::Configuration(
                "serpentine_row_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Position of one photograph on the plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    /// 0-based capture index
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned extent of a path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Ordered positions, one per input item, indexed by capture order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutPath {
    points: Vec<LayoutPoint>,
}

impl LayoutPath {
    #[must_use]
    pub fn points(&self) -> &[LayoutPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&LayoutPoint> {
        self.points.get(index)
    }

    /// Extent of all points padded by `margin`; `None` for an empty path
    #[must_use]
    pub fn bounds(&self, margin: f64) -> Option<Bounds> {
        let first = self.points.first()?;
        let mut bounds = Bounds {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for p in &self.points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        bounds.min_x -= margin;
        bounds.max_x += margin;
        bounds.min_y -= margin;
        bounds.max_y += margin;
        Some(bounds)
    }
}

/// Smallest `w` with `w * w >= n`
#[must_use]
pub fn grid_width(n: usize) -> usize {
    let mut w = (n as f64).sqrt() as usize;
    while w * w < n {
        w += 1;
    }
    while w > 0 && (w - 1) * (w - 1) >= n {
        w -= 1;
    }
    w
}

/// Column offset within a serpentine row; odd rows run right to left
#[must_use]
pub fn serpentine_column(row: usize, col: usize, row_width: usize) -> usize {
    if row % 2 == 0 {
        col
    } else {
        row_width - 1 - col
    }
}

fn linear(n: usize, spacing: f64) -> Vec<LayoutPoint> {
    (0..n)
        .map(|i| LayoutPoint {
            index: i,
            x: i as f64 * spacing,
            y: 0.0,
        })
        .collect()
}

fn grid(n: usize, spacing: f64) -> Vec<LayoutPoint> {
    let width = grid_width(n);
    (0..n)
        .map(|i| {
            let (row, col) = (i / width, i % width);
            LayoutPoint {
                index: i,
                x: col as f64 * spacing,
                y: row as f64 * spacing,
            }
        })
        .collect()
}

fn serpentine(n: usize, spacing: f64, row_width: usize) -> Vec<LayoutPoint> {
    (0..n)
        .map(|i| {
            let (row, col) = (i / row_width, i % row_width);
            LayoutPoint {
                index: i,
                x: serpentine_column(row, col, row_width) as f64 * spacing,
                y: row as f64 * spacing,
            }
        })
        .collect()
}

/// Place `n` items under `strategy`
///
/// # Errors
/// Returns [`ProcessingError::Configuration`] if `config` is invalid
pub fn place(n: usize, strategy: LayoutStrategy, config: &LayoutConfig) -> Result<LayoutPath> {
    config.validate()?;
    let points = match strategy {
        LayoutStrategy::Linear => linear(n, config.spacing),
        LayoutStrategy::Grid => grid(n, config.spacing),
        LayoutStrategy::Serpentine => serpentine(n, config.spacing, config.serpentine_row_width),
        LayoutStrategy::Auto => {
            debug!("No path inference available, using serpentine layout for {n} positions");
            serpentine(n, config.spacing, config.serpentine_row_width)
        }
    };
    Ok(LayoutPath { points })
}
