//! Sobel gradients and Canny edge detection.
//!
//! # Canny Pipeline
//!
//! 1. Reduce to luminance ([`crate::color::to_gray`]) if needed
//! 2. 3x3 Sobel gradients, replicate border
//! 3. L1 magnitude `|dx| + |dy|`
//! 4. Non-maximum suppression along the gradient direction, quantized to
//!    0, 45, 90 and 135 degrees
//! 5. Hysteresis: pixels above `high` seed edges, which grow through
//!    8-connected pixels above `low`
//!
//! The output is a `Gray8` image holding only 0 and 255.

use crate::color::to_gray;
use crate::filter::replicate;
use crate::{ensure_valid, OpsError, OpsResult};
use imgduo_core::{ImageBuffer, PixelType};
use rayon::prelude::*;
use tracing::{debug, trace};

/// Hysteresis lower threshold.
pub const CANNY_LOW_THRESHOLD: f64 = 100.0;

/// Hysteresis upper threshold.
pub const CANNY_HIGH_THRESHOLD: f64 = 200.0;

/// Sobel aperture used for Canny gradients.
pub const CANNY_APERTURE: u32 = 3;

/// `tan(22.5 deg)` in 15-bit fixed point.
const TG22: i64 = 13573;
const SHIFT: u32 = 15;

/// Horizontal and vertical 3x3 Sobel derivatives of a packed gray plane.
///
/// Returns `(dx, dy)`, each `width * height` long, row-major.
pub fn sobel_3x3(gray: &[u8], width: usize, height: usize) -> (Vec<i32>, Vec<i32>) {
    trace!(width, height, "sobel_3x3");
    let mut dx = vec![0i32; width * height];
    let mut dy = vec![0i32; width * height];
    let at = |x: isize, y: isize| -> i32 {
        gray[replicate(y, height) * width + replicate(x, width)] as i32
    };

    dx.par_chunks_mut(width)
        .zip(dy.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_dx, row_dy))| {
            let y = y as isize;
            for x in 0..width {
                let xi = x as isize;
                let (tl, tc, tr) = (at(xi - 1, y - 1), at(xi, y - 1), at(xi + 1, y - 1));
                let (ml, mr) = (at(xi - 1, y), at(xi + 1, y));
                let (bl, bc, br) = (at(xi - 1, y + 1), at(xi, y + 1), at(xi + 1, y + 1));
                row_dx[x] = (tr + 2 * mr + br) - (tl + 2 * ml + bl);
                row_dy[x] = (bl + 2 * bc + br) - (tl + 2 * tc + tr);
            }
        });
    (dx, dy)
}

/// Canny edge detector with a 3x3 Sobel aperture and L1 magnitude.
///
/// Thresholds are swapped if given in the wrong order.
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_ops::edge::{canny, CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD};
///
/// let flat = ImageBuffer::filled(16, 16, PixelType::Bgr8, &[90, 90, 90]).unwrap();
/// let edges = canny(&flat, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD).unwrap();
/// assert_eq!(edges.pixel_type(), PixelType::Gray8);
/// assert!(edges.data().iter().all(|&v| v == 0));
/// ```
pub fn canny(image: &ImageBuffer, low: f64, high: f64) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "canny")?;
    if !(low.is_finite() && high.is_finite()) {
        return Err(OpsError::InvalidParameter("canny thresholds must be finite".into()));
    }
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    // Integer magnitudes compare against floored thresholds
    let (low, high) = (low.floor() as i64, high.floor() as i64);
    debug!(low, high, "canny");

    let gray = to_gray(image)?;
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let plane = gray.as_packed();
    let (dx, dy) = sobel_3x3(&plane, width, height);
    let mag: Vec<i64> = dx
        .iter()
        .zip(&dy)
        .map(|(&gx, &gy)| (gx.abs() + gy.abs()) as i64)
        .collect();
    let m = |x: isize, y: isize| -> i64 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0
        } else {
            mag[y as usize * width + x as usize]
        }
    };

    // 0 = weak candidate, 1 = not an edge, 2 = edge
    let mut map = vec![1u8; width * height];
    let mut stack = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let v = mag[i];
            if v <= low {
                continue;
            }
            let (gx, gy) = (dx[i] as i64, dy[i] as i64);
            let (xi, yi) = (x as isize, y as isize);
            let xs = gx.abs();
            let ys = gy.abs() << SHIFT;
            let tg22x = xs * TG22;

            let is_max = if ys < tg22x {
                v > m(xi - 1, yi) && v >= m(xi + 1, yi)
            } else {
                let tg67x = tg22x + (xs << (SHIFT + 1));
                if ys > tg67x {
                    v > m(xi, yi - 1) && v >= m(xi, yi + 1)
                } else {
                    let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
                    v > m(xi - s, yi - 1) && v > m(xi + s, yi + 1)
                }
            };

            if is_max {
                if v > high {
                    map[i] = 2;
                    stack.push(i);
                } else {
                    map[i] = 0;
                }
            }
        }
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % width) as isize, (i / width) as isize);
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let j = ny as usize * width + nx as usize;
                if map[j] == 0 {
                    map[j] = 2;
                    stack.push(j);
                }
            }
        }
    }

    let edges = map.iter().map(|&v| if v == 2 { 255 } else { 0 }).collect();
    Ok(ImageBuffer::from_raw(gray.width(), gray.height(), PixelType::Gray8, edges)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(width: u32, height: u32, at: u32) -> ImageBuffer {
        let mut img = ImageBuffer::new(width, height, PixelType::Gray8).unwrap();
        for y in 0..height {
            for x in at..width {
                img.set_pixel(x, y, &[255]);
            }
        }
        img
    }

    #[test]
    fn test_sobel_on_ramp() {
        // Horizontal ramp of slope 10: dx = 4 * (30 - 10), dy = 0
        let plane: Vec<u8> = (0..5).flat_map(|_| (0..5).map(|x| x * 10)).collect();
        let (dx, dy) = sobel_3x3(&plane, 5, 5);
        assert_eq!(dx[2 * 5 + 2], 80);
        assert_eq!(dy[2 * 5 + 2], 0);
    }

    #[test]
    fn test_vertical_step_gives_thin_line() {
        let edges = canny(&step(20, 10, 10), CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD).unwrap();
        assert_eq!(edges.pixel_type(), PixelType::Gray8);
        for y in 0..10 {
            let row = edges.row(y);
            let on: Vec<usize> = (0..20).filter(|&x| row[x] == 255).collect();
            assert_eq!(on.len(), 1, "row {y}: {on:?}");
            assert!(on[0] == 9 || on[0] == 10);
        }
        assert!(edges.data().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_weak_step_is_ignored() {
        // Step of 20 gives magnitude 80 < low
        let mut img = ImageBuffer::filled(12, 6, PixelType::Gray8, &[100]).unwrap();
        for y in 0..6 {
            for x in 6..12 {
                img.set_pixel(x, y, &[120]);
            }
        }
        let edges = canny(&img, 100.0, 200.0).unwrap();
        assert!(edges.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_color_input_and_swapped_thresholds() {
        let gray = step(16, 8, 8);
        let bgr = crate::color::convert(&gray, PixelType::Bgr8).unwrap();
        let a = canny(&bgr, 200.0, 100.0).unwrap();
        let b = canny(&gray, 100.0, 200.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_threshold() {
        let img = step(4, 4, 2);
        assert!(canny(&img, f64::NAN, 200.0).is_err());
    }
}
