//! Geometry and signal primitives shared by the feature extractor
//!
//! Everything here is a pure function over numbers or point lists:
//! - Segment angles and vertical/horizontal bucketing
//! - Axis-aligned bounding boxes and the door aspect-ratio test
//! - Closed-contour polygon approximation (Douglas-Peucker)
//! - Zero-offset normalized cross-correlation
//! - Mean / population standard deviation over a scalar field
//! - Luminance and HSV channel derivation (8-bit conventions)

use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;

/// Undirected angle of the segment `p1 -> p2` in degrees, in [0, 180]
#[must_use]
pub fn segment_angle_degrees(p1: Point<i32>, p2: Point<i32>) -> f64 {
    let dy = f64::from(p2.y - p1.y);
    let dx = f64::from(p2.x - p1.x);
    dy.atan2(dx).to_degrees().abs()
}

/// Angle bucket of a detected line segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOrientation {
    Vertical,
    Horizontal,
    Oblique,
}

/// Bucket an undirected angle: vertical in (80, 100), horizontal below 10 or above 170
#[must_use]
pub fn classify_angle(angle_degrees: f64) -> LineOrientation {
    if angle_degrees > 80.0 && angle_degrees < 100.0 {
        LineOrientation::Vertical
    } else if angle_degrees < 10.0 || angle_degrees > 170.0 {
        LineOrientation::Horizontal
    } else {
        LineOrientation::Oblique
    }
}

/// Axis-aligned bounding box in pixel units (inclusive extents)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    /// Width over height, 0.0 for a zero-height box
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        if self.height > 0 {
            f64::from(self.width) / f64::from(self.height)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }
}

/// Smallest upright box containing every point, `None` for an empty slice
#[must_use]
pub fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Door heuristic: aspect ratio strictly inside `(aspect_min, aspect_max)` and area above
/// `min_area`
#[must_use]
pub fn is_door_shaped(
    bbox: &BoundingBox,
    aspect_min: f64,
    aspect_max: f64,
    min_area: i64,
) -> bool {
    let aspect = bbox.aspect_ratio();
    aspect > aspect_min && aspect < aspect_max && bbox.area() > min_area
}

fn squared_distance(a: Point<i32>, b: Point<i32>) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}

/// Approximate a closed contour by a polygon whose vertices stay within
/// `epsilon_ratio * perimeter` of the original border.
///
/// The contour is split at the point farthest from its first point and each half is
/// simplified as an open curve, so the two split points are always kept as vertices.
#[must_use]
pub fn approximate_closed_polygon(contour: &[Point<i32>], epsilon_ratio: f64) -> Vec<Point<i32>> {
    if contour.len() < 3 {
        return contour.to_vec();
    }

    let perimeter = arc_length(contour, true);
    let epsilon = epsilon_ratio * perimeter;
    if epsilon <= 0.0 {
        return contour.to_vec();
    }

    let start = contour[0];
    let (far, far_dist) = contour
        .iter()
        .enumerate()
        .map(|(i, &p)| (i, squared_distance(start, p)))
        .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if far_dist == 0 {
        return vec![start];
    }

    let mut second_half: Vec<Point<i32>> = contour[far..].to_vec();
    second_half.push(start);

    let mut polygon = approximate_polygon_dp(&contour[..=far], epsilon, false);
    let tail = approximate_polygon_dp(&second_half, epsilon, false);
    // Both halves share the split point and the start point.
    polygon.pop();
    polygon.extend(tail);
    polygon.pop();
    polygon.dedup();
    polygon
}

/// Zero-offset normalized cross-correlation of two equally sized samples.
///
/// Both inputs are mean-centred first, so the score is in [-1, 1]. Returns 0.0 when the
/// lengths differ, the samples are empty, or either sample has no variance.
#[must_use]
pub fn normalized_cross_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&va, &vb) in a.iter().zip(b) {
        let da = va - mean_a;
        let db = vb - mean_b;
        num += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (num / denom).clamp(-1.0, 1.0)
}

/// Mean and population standard deviation of a scalar field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FieldStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Compute [`FieldStats`]; an empty field yields zeros
#[must_use]
pub fn field_stats<I>(values: I) -> FieldStats
where
    I: IntoIterator<Item = u8>,
{
    // Integer accumulation keeps the result independent of summation order.
    let mut count: u64 = 0;
    let mut sum: u64 = 0;
    let mut sum_sq: u64 = 0;
    for v in values {
        let v = u64::from(v);
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 {
        return FieldStats::default();
    }
    let n = count as f64;
    let mean = sum as f64 / n;
    let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
    FieldStats {
        mean,
        std_dev: variance.sqrt(),
    }
}

/// 8-bit luminance with fixed-point BT.601 weights (0.299, 0.587, 0.114)
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    const SHIFT: u32 = 14;
    const R_W: u32 = 4899;
    const G_W: u32 = 9617;
    const B_W: u32 = 1868;
    let y = (u32::from(r) * R_W + u32::from(g) * G_W + u32::from(b) * B_W + (1 << (SHIFT - 1)))
        >> SHIFT;
    y.min(255) as u8
}

/// Saturation and value channels of the 8-bit HSV representation
///
/// `value = max(r, g, b)`, `saturation = 255 * (max - min) / max` (0 for black).
#[must_use]
pub fn saturation_value(r: u8, g: u8, b: u8) -> (u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == 0 {
        return (0, 0);
    }
    let s = (f64::from(max - min) * 255.0 / f64::from(max)).round();
    (s.min(255.0) as u8, max)
}
