//! Corner detection and binary descriptors.
//!
//! Corners are Harris maxima; each is described by 256 intensity
//! comparisons inside a smoothed 31x31 patch (BRIEF). The comparison
//! pattern is drawn once from a fixed seed, so descriptors are comparable
//! across images and runs.

use crate::edge::sobel_3x3;
use crate::filter::replicate;
use imgduo_core::ImageBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::OnceLock;
use tracing::trace;

/// Harris sensitivity `k` in `det - k * trace^2`.
pub const HARRIS_K: f32 = 0.04;

/// Corners weaker than this fraction of the strongest are dropped.
pub const HARRIS_QUALITY: f32 = 0.01;

/// Corners closer than this to the image edge are dropped.
pub const FEATURE_BORDER: usize = 16;

/// Side of the descriptor patch.
pub const PATCH_SIZE: usize = 31;

const PATCH_HALF: i8 = (PATCH_SIZE / 2) as i8;
const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x1D0_2B1E;

/// A detected corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Harris response.
    pub response: f32,
}

impl Keypoint {
    /// Position as floating point `(x, y)`.
    pub fn position(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// 256-bit binary descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    /// Number of differing bits.
    #[inline]
    pub fn hamming(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// A keypoint with its descriptor.
#[derive(Debug, Clone, Copy)]
pub struct Feature {
    /// Location.
    pub keypoint: Keypoint,
    /// Appearance.
    pub descriptor: Descriptor,
}

/// Separable Gaussian blur of an `f32` plane, replicate border.
pub(crate) fn gaussian_blur(src: &[f32], width: usize, height: usize, sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as isize;
    let mut taps: Vec<f32> = (-radius..=radius)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.iter_mut().for_each(|t| *t /= sum);

    let mut tmp = vec![0.0f32; width * height];
    tmp.par_chunks_mut(width).enumerate().for_each(|(y, out)| {
        let row = &src[y * width..][..width];
        for (x, o) in out.iter_mut().enumerate() {
            *o = taps
                .iter()
                .enumerate()
                .map(|(k, t)| t * row[replicate(x as isize + k as isize - radius, width)])
                .sum();
        }
    });

    let mut dst = vec![0.0f32; width * height];
    dst.par_chunks_mut(width).enumerate().for_each(|(y, out)| {
        for (x, o) in out.iter_mut().enumerate() {
            *o = taps
                .iter()
                .enumerate()
                .map(|(k, t)| t * tmp[replicate(y as isize + k as isize - radius, height) * width + x])
                .sum();
        }
    });
    dst
}

/// Harris corner response for every pixel of a packed gray plane.
pub fn harris_response(gray: &[u8], width: usize, height: usize) -> Vec<f32> {
    let (dx, dy) = sobel_3x3(gray, width, height);
    let n = width * height;
    let (mut xx, mut yy, mut xy) = (vec![0.0f32; n], vec![0.0f32; n], vec![0.0f32; n]);
    for i in 0..n {
        let (gx, gy) = (dx[i] as f32 / 8.0, dy[i] as f32 / 8.0);
        xx[i] = gx * gx;
        yy[i] = gy * gy;
        xy[i] = gx * gy;
    }
    // 5x5 window
    let xx = gaussian_blur(&xx, width, height, 2.0 / 3.0);
    let yy = gaussian_blur(&yy, width, height, 2.0 / 3.0);
    let xy = gaussian_blur(&xy, width, height, 2.0 / 3.0);

    (0..n)
        .map(|i| {
            let det = xx[i] * yy[i] - xy[i] * xy[i];
            let trace = xx[i] + yy[i];
            det - HARRIS_K * trace * trace
        })
        .collect()
}

/// Strongest Harris corners of a `Gray8` image, at most `max_corners`.
///
/// A corner must beat [`HARRIS_QUALITY`] of the strongest response, be a
/// 3x3 local maximum and lie at least [`FEATURE_BORDER`] pixels inside.
pub fn detect_corners(gray: &ImageBuffer, max_corners: usize) -> Vec<Keypoint> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width <= 2 * FEATURE_BORDER || height <= 2 * FEATURE_BORDER {
        return Vec::new();
    }
    let plane = gray.as_packed();
    let response = harris_response(&plane, width, height);
    let max = response.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let threshold = HARRIS_QUALITY * max;

    let mut corners = Vec::new();
    for y in FEATURE_BORDER..height - FEATURE_BORDER {
        for x in FEATURE_BORDER..width - FEATURE_BORDER {
            let r = response[y * width + x];
            if r <= threshold {
                continue;
            }
            // Strict against earlier neighbours so plateaus yield one corner
            let is_max = (-1isize..=1).all(|oy| {
                (-1isize..=1).all(|ox| {
                    if ox == 0 && oy == 0 {
                        return true;
                    }
                    let n = response[(y as isize + oy) as usize * width + (x as isize + ox) as usize];
                    if oy < 0 || (oy == 0 && ox < 0) { r > n } else { r >= n }
                })
            });
            if is_max {
                corners.push(Keypoint {
                    x: x as u32,
                    y: y as u32,
                    response: r,
                });
            }
        }
    }

    corners.sort_by(|a, b| b.response.total_cmp(&a.response));
    corners.truncate(max_corners);
    trace!(count = corners.len(), "harris corners");
    corners
}

/// The fixed comparison pattern: `(x1, y1, x2, y2)` offsets.
fn pattern() -> &'static [[i8; 4]] {
    static PATTERN: OnceLock<Vec<[i8; 4]>> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        (0..DESCRIPTOR_BITS)
            .map(|_| {
                let mut p = [0i8; 4];
                p.iter_mut()
                    .for_each(|v| *v = rng.gen_range(-PATCH_HALF..=PATCH_HALF));
                p
            })
            .collect()
    })
}

/// Describes keypoints of a `Gray8` image.
///
/// Keypoints whose patch would leave the image are skipped.
pub fn describe(gray: &ImageBuffer, keypoints: &[Keypoint]) -> Vec<Feature> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let plane: Vec<f32> = gray.as_packed().iter().map(|&v| v as f32).collect();
    let smooth = gaussian_blur(&plane, width, height, 2.0);
    let half = PATCH_HALF as i64;
    let pattern = pattern();

    keypoints
        .iter()
        .filter(|kp| {
            let (x, y) = (kp.x as i64, kp.y as i64);
            x >= half && y >= half && x + half < width as i64 && y + half < height as i64
        })
        .map(|kp| {
            let at = |ox: i8, oy: i8| {
                let x = (kp.x as i64 + ox as i64) as usize;
                let y = (kp.y as i64 + oy as i64) as usize;
                smooth[y * width + x]
            };
            let mut bits = [0u64; 4];
            for (i, p) in pattern.iter().enumerate() {
                if at(p[0], p[1]) < at(p[2], p[3]) {
                    bits[i / 64] |= 1 << (i % 64);
                }
            }
            Feature {
                keypoint: *kp,
                descriptor: Descriptor(bits),
            }
        })
        .collect()
}

/// Corner detection followed by description.
pub fn detect_and_describe(gray: &ImageBuffer, max_corners: usize) -> Vec<Feature> {
    let corners = detect_corners(gray, max_corners);
    describe(gray, &corners)
}
