//! Canny edge map computed on the raw Sobel gradient
//!
//! No smoothing runs before differentiation. The gradient magnitude is the L1 norm
//! `|gx| + |gy|`. Non-maximum suppression compares each pixel with its two neighbours along
//! the gradient direction, quantized to 0, 45, 90 or 135 degrees. Hysteresis then grows
//! edges from pixels above `high` through 8-connected survivors above `low`.
//!
//! On a plateau of equal magnitudes only the first pixel along the gradient survives
//! suppression (strictly greater than the previous neighbour, at least the next one).

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// tan(22.5 deg) in 1.15 fixed point
const TAN_22_5: i64 = 13573;

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Rejected,
    Weak,
    Strong,
}

/// Binary edge map (255 = edge) using hysteresis thresholds on the 0-255 intensity scale
///
/// Thresholds are swapped if given in the wrong order.
#[must_use]
pub fn detect_edges(gray: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let low = low.floor() as i32;
    let high = high.floor() as i32;

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let magnitude: Vec<i32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(dx, dy)| i32::from(dx[0]).abs() + i32::from(dy[0]).abs())
        .collect();

    let w = i64::from(width);
    let h = i64::from(height);
    let mag_at = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0
        } else {
            magnitude[(y * w + x) as usize]
        }
    };

    let mut state = vec![EdgeState::Rejected; magnitude.len()];
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let m = magnitude[idx];
            if m <= low {
                continue;
            }

            let dx = i64::from(gx.get_pixel(x as u32, y as u32)[0]);
            let dy = i64::from(gy.get_pixel(x as u32, y as u32)[0]);
            let ax = dx.abs();
            let ay = dy.abs() << 15;
            let tan22 = ax * TAN_22_5;

            let is_ridge = if ay < tan22 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ay > tan22 + (ax << 16) {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else {
                let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
            };
            if !is_ridge {
                continue;
            }

            if m > high {
                state[idx] = EdgeState::Strong;
                stack.push((x, y));
            } else {
                state[idx] = EdgeState::Weak;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for (ox, oy) in NEIGHBOURS {
            let (nx, ny) = (x + ox, y + oy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if state[idx] == EdgeState::Weak {
                state[idx] = EdgeState::Strong;
                stack.push((nx, ny));
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let idx = (i64::from(y) * w + i64::from(x)) as usize;
        if state[idx] == EdgeState::Strong {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_columns(edges: &GrayImage) -> Vec<u32> {
        (0..edges.width())
            .filter(|&x| edges.get_pixel(x, 0)[0] > 0)
            .collect()
    }

    fn stripes(width: u32, height: u32, period: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if (x / period) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn test_flat_image_has_no_edges() {
        let edges = detect_edges(&GrayImage::from_pixel(32, 16, Luma([90])), 50.0, 150.0);
        assert!(edges.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_step_edge_is_one_pixel_thick() {
        let gray = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let edges = detect_edges(&gray, 50.0, 150.0);
        assert_eq!(edge_columns(&edges), vec![9]);
        assert_eq!(edges.pixels().filter(|p| p[0] > 0).count(), 10);
    }

    #[test]
    fn test_three_pixel_stripes_keep_every_boundary() {
        // Width 198 holds 33 full periods; both boundaries of every stripe survive
        // except where the replicated border flattens the gradient.
        let edges = detect_edges(&stripes(198, 12, 3), 50.0, 150.0);
        let columns = edge_columns(&edges);
        assert_eq!(columns.len(), 65);
        assert!(columns.iter().all(|x| x % 6 == 2 || x % 6 == 5));
        assert_eq!(edges.pixels().filter(|p| p[0] > 0).count(), 65 * 12);
    }

    #[test]
    fn test_two_pixel_stripes_form_a_gradient_plateau() {
        // Every interior column carries the same magnitude, so only the leading
        // column of the plateau is a strict maximum.
        let edges = detect_edges(&stripes(200, 8, 2), 50.0, 150.0);
        assert_eq!(edge_columns(&edges), vec![1]);
    }

    #[test]
    fn test_weak_response_needs_strong_neighbour() {
        // Step of 20 levels: |gx| = 80, between the thresholds, with no strong seed.
        let gray = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 100 } else { 120 }]));
        let edges = detect_edges(&gray, 50.0, 150.0);
        assert!(edges.pixels().all(|p| p[0] == 0));

        // The same weak step continues a strong one along the column.
        let gray = GrayImage::from_fn(20, 10, |x, y| {
            let high = if y < 5 { 255 } else { 120 };
            Luma([if x < 10 { 100 } else { high }])
        });
        let edges = detect_edges(&gray, 50.0, 150.0);
        assert!(edges.get_pixel(9, 9)[0] > 0);
    }

    #[test]
    fn test_thresholds_in_either_order() {
        let gray = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        assert_eq!(
            detect_edges(&gray, 150.0, 50.0),
            detect_edges(&gray, 50.0, 150.0)
        );
    }

    #[test]
    fn test_single_pixel_image() {
        let edges = detect_edges(&GrayImage::from_pixel(1, 1, Luma([200])), 50.0, 150.0);
        assert_eq!(edges.dimensions(), (1, 1));
        assert_eq!(edges.get_pixel(0, 0)[0], 0);
    }
}
