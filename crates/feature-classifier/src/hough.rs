//! Progressive probabilistic Hough transform over a binary edge map
//!
//! Edge pixels are visited in a pseudo-random order. Each pixel votes into a (theta, rho)
//! accumulator with 1 degree / 1 pixel resolution; as soon as a cell reaches the vote
//! threshold the corresponding line is walked in both directions across the edge map,
//! bridging gaps up to `max_line_gap`. The walked pixels are removed from the map (and
//! their votes retracted when the segment is long enough) so each edge pixel contributes
//! to at most one segment.
//!
//! The visiting order comes from a seeded generator, so the same edge map always yields
//! the same segments.

use image::GrayImage;
use imageproc::point::Point;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const NUM_ANGLES: usize = 180;
const FIXED_SHIFT: u32 = 16;

/// Parameters for [`detect_segments`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughParams {
    /// Minimum accumulator votes before a line is traced
    pub threshold: u32,
    /// Minimum extent (in x or y) of a reported segment, in pixels
    pub min_line_length: u32,
    /// Largest run of missing edge pixels bridged while tracing
    pub max_line_gap: u32,
    /// Seed for the pixel visiting order
    pub seed: u64,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            threshold: 100,
            min_line_length: 100,
            max_line_gap: 10,
            seed: 0x5eed_cafe,
        }
    }
}

/// A detected line segment in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub start: Point<i32>,
    pub end: Point<i32>,
}

/// Walk direction along a candidate line, in 16.16 fixed point for the minor axis
struct Walk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl Walk {
    fn new(x: i64, y: i64, cos_t: f64, sin_t: f64) -> Self {
        let a = -sin_t;
        let b = cos_t;
        let half = 1i64 << (FIXED_SHIFT - 1);
        let scale = f64::from(1u32 << FIXED_SHIFT);
        if a.abs() > b.abs() {
            Self {
                x0: x,
                y0: (y << FIXED_SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * scale / a.abs()).round() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: (x << FIXED_SHIFT) + half,
                y0: y,
                dx: (a * scale / b.abs()).round() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    fn pixel(&self, x: i64, y: i64) -> (i64, i64) {
        if self.x_major {
            (x, y >> FIXED_SHIFT)
        } else {
            (x >> FIXED_SHIFT, y)
        }
    }
}

struct Accumulator {
    cells: Vec<i32>,
    num_rho: usize,
    trig: Vec<(f64, f64)>,
}

impl Accumulator {
    fn new(width: u32, height: u32) -> Self {
        let num_rho = ((width as usize + height as usize) * 2) + 1;
        let trig = (0..NUM_ANGLES)
            .map(|n| {
                let theta = (n as f64).to_radians();
                (theta.cos(), theta.sin())
            })
            .collect();
        Self {
            cells: vec![0; NUM_ANGLES * num_rho],
            num_rho,
            trig,
        }
    }

    fn rho_index(&self, n: usize, x: i64, y: i64) -> usize {
        let (c, s) = self.trig[n];
        let r = (x as f64 * c + y as f64 * s).round() as i64;
        (r + (self.num_rho as i64 - 1) / 2) as usize
    }

    /// Add one vote per angle for `(x, y)`, returning the strongest cell
    fn vote(&mut self, x: i64, y: i64) -> (usize, i32) {
        let mut best = (0, i32::MIN);
        for n in 0..NUM_ANGLES {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.cells[idx] += 1;
            if self.cells[idx] > best.1 {
                best = (n, self.cells[idx]);
            }
        }
        best
    }

    fn retract(&mut self, x: i64, y: i64) {
        for n in 0..NUM_ANGLES {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.cells[idx] -= 1;
        }
    }
}

/// Detect line segments in a binary edge map (non-zero pixels are edges)
#[must_use]
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    let w = width as i64;
    let h = height as i64;
    let mut mask: Vec<bool> = edges.pixels().map(|p| p[0] > 0).collect();

    let mut points: Vec<(i64, i64)> = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&(x, y)| mask[(y * w + x) as usize])
        .collect();
    if points.is_empty() {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    points.shuffle(&mut rng);

    let mut accumulator = Accumulator::new(width, height);
    let threshold = i32::try_from(params.threshold).unwrap_or(i32::MAX);
    let max_gap = i64::from(params.max_line_gap);
    let min_length = i64::from(params.min_line_length);
    let mut segments = Vec::new();

    for &(px, py) in &points {
        if !mask[(py * w + px) as usize] {
            continue;
        }

        let (best_angle, best_votes) = accumulator.vote(px, py);
        if best_votes < threshold {
            continue;
        }

        let (cos_t, sin_t) = accumulator.trig[best_angle];
        let walk = Walk::new(px, py, cos_t, sin_t);

        // Find the furthest edge pixel in each direction, tolerating short gaps.
        let mut line_end = [(px, py); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (dx, dy) = if k == 0 {
                (walk.dx, walk.dy)
            } else {
                (-walk.dx, -walk.dy)
            };
            let (mut x, mut y) = (walk.x0, walk.y0);
            let mut gap = 0;
            loop {
                let (cx, cy) = walk.pixel(x, y);
                if cx < 0 || cx >= w || cy < 0 || cy >= h {
                    break;
                }
                if mask[(cy * w + cx) as usize] {
                    gap = 0;
                    *end = (cx, cy);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() >= min_length
            || (line_end[1].1 - line_end[0].1).abs() >= min_length;

        // Clear the traced pixels; retract their votes if the segment is kept.
        for (k, &end) in line_end.iter().enumerate() {
            let (dx, dy) = if k == 0 {
                (walk.dx, walk.dy)
            } else {
                (-walk.dx, -walk.dy)
            };
            let (mut x, mut y) = (walk.x0, walk.y0);
            loop {
                let (cx, cy) = walk.pixel(x, y);
                if cx < 0 || cx >= w || cy < 0 || cy >= h {
                    break;
                }
                let idx = (cy * w + cx) as usize;
                if mask[idx] {
                    if good_line {
                        accumulator.retract(cx, cy);
                    }
                    mask[idx] = false;
                }
                if (cx, cy) == end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good_line {
            segments.push(LineSegment {
                start: Point::new(line_end[0].0 as i32, line_end[0].1 as i32),
                end: Point::new(line_end[1].0 as i32, line_end[1].1 as i32),
            });
        }
    }

    segments
}
