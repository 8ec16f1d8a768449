//! Poisson seamless cloning.
//!
//! Pastes the masked region of a source image into a destination so that
//! the result keeps the source's gradients but meets the destination along
//! the region boundary.
//!
//! # Algorithm
//!
//! 1. The bounding box of the mask (ignoring its outermost pixel ring) is
//!    taken from the source and placed so its center lands on `center` in
//!    the destination.
//! 2. Inside that box a guidance field is built from forward differences:
//!    source gradients where the mask is set, destination gradients
//!    elsewhere. [`CloneMode::Mixed`] keeps whichever of the two is
//!    stronger under the mask.
//! 3. The divergence of the field is the right-hand side of a Poisson
//!    equation whose Dirichlet boundary is the destination's pixels on the
//!    box's outer ring.
//! 4. The equation is solved exactly per channel by diagonalizing the
//!    5-point Laplacian with a 2D discrete sine transform (DST-I), computed
//!    through an FFT of twice the length.
//!
//! Alpha, when present, is taken from the destination unchanged.

use crate::{ensure_valid, saturate_u8, OpsError, OpsResult};
use imgduo_core::{ImageBuffer, PixelType};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::{debug, trace};

/// Which gradients guide the cloned region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneMode {
    /// Source gradients everywhere under the mask.
    #[default]
    Normal,
    /// The stronger of source and destination gradient under the mask.
    Mixed,
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left column.
    pub x: i64,
    /// Top row.
    pub y: i64,
    /// Width in pixels.
    pub width: i64,
    /// Height in pixels.
    pub height: i64,
}

impl Rect {
    /// Center point, rounded down.
    pub fn center(&self) -> (i64, i64) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    fn inside(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width <= width as i64
            && self.y + self.height <= height as i64
    }
}

/// A `Gray8` mask of `width` x `height` holding 255 inside the centered
/// rectangle of half the width and half the height, 0 elsewhere.
///
/// The rectangle starts half its own size before the image center
/// `(width / 2, height / 2)`, so [`Rect::center`] returns that center.
pub fn centered_rect_mask(width: u32, height: u32) -> OpsResult<(ImageBuffer, Rect)> {
    let (cx, cy) = ((width / 2) as i64, (height / 2) as i64);
    let (rw, rh) = (cx, cy);
    let rect = Rect {
        x: cx - rw / 2,
        y: cy - rh / 2,
        width: rw,
        height: rh,
    };
    let mut mask = ImageBuffer::new(width, height, PixelType::Gray8)?;
    for y in rect.y..rect.y + rect.height {
        let row = mask.row_mut(y as u32);
        row[rect.x as usize..(rect.x + rect.width) as usize].fill(255);
    }
    Ok((mask, rect))
}

/// Bounding box of the non-zero mask pixels, skipping the outermost ring.
fn mask_bounds(mask: &ImageBuffer) -> Option<Rect> {
    let (w, h) = mask.dimensions();
    if w < 3 || h < 3 {
        return None;
    }
    let (mut x0, mut y0, mut x1, mut y1) = (u32::MAX, u32::MAX, 0u32, 0u32);
    for y in 1..h - 1 {
        let row = mask.row(y);
        for x in 1..w - 1 {
            if row[x as usize] != 0 {
                x0 = x0.min(x);
                x1 = x1.max(x);
                y0 = y0.min(y);
                y1 = y1.max(y);
            }
        }
    }
    (x0 <= x1).then(|| Rect {
        x: x0 as i64,
        y: y0 as i64,
        width: (x1 - x0 + 1) as i64,
        height: (y1 - y0 + 1) as i64,
    })
}

/// Clones the masked part of `src` into `dst`, centered at `center`.
///
/// `src` and `dst` must share a pixel type; `mask` must be `Gray8` with the
/// size of `src`.
///
/// # Errors
///
/// - [`OpsError::SizeMismatch`] for mismatched types or mask size
/// - [`OpsError::InvalidParameter`] for an empty mask or a placement that
///   leaves the destination
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_ops::clone::{centered_rect_mask, seamless_clone, CloneMode};
///
/// let dst = ImageBuffer::filled(40, 30, PixelType::Bgr8, &[50, 50, 50]).unwrap();
/// let src = ImageBuffer::filled(40, 30, PixelType::Bgr8, &[200, 10, 10]).unwrap();
/// let (mask, rect) = centered_rect_mask(40, 30).unwrap();
/// let (cx, cy) = rect.center();
/// let out = seamless_clone(&src, &dst, &mask, (cx, cy), CloneMode::Normal).unwrap();
/// // A flat source has no gradients: the patch takes the destination's level
/// assert_eq!(out, dst);
/// ```
pub fn seamless_clone(
    src: &ImageBuffer,
    dst: &ImageBuffer,
    mask: &ImageBuffer,
    center: (i64, i64),
    mode: CloneMode,
) -> OpsResult<ImageBuffer> {
    ensure_valid(src, "seamless_clone source")?;
    ensure_valid(dst, "seamless_clone destination")?;
    if src.pixel_type() != dst.pixel_type() {
        return Err(OpsError::SizeMismatch(format!(
            "source {} vs destination {}",
            src.pixel_type(),
            dst.pixel_type()
        )));
    }
    if mask.pixel_type() != PixelType::Gray8 || mask.dimensions() != src.dimensions() {
        return Err(OpsError::SizeMismatch(format!(
            "mask must be 8UC1 {}x{}, got {} {}x{}",
            src.width(),
            src.height(),
            mask.pixel_type(),
            mask.width(),
            mask.height()
        )));
    }

    let roi_s = mask_bounds(mask)
        .ok_or_else(|| OpsError::InvalidParameter("mask has no interior pixels".into()))?;
    let roi_d = Rect {
        x: center.0 - roi_s.width / 2,
        y: center.1 - roi_s.height / 2,
        width: roi_s.width,
        height: roi_s.height,
    };
    if !roi_d.inside(dst.width(), dst.height()) {
        return Err(OpsError::InvalidParameter(format!(
            "clone region {roi_d:?} leaves the {}x{} destination",
            dst.width(),
            dst.height()
        )));
    }
    debug!(?roi_s, ?roi_d, ?mode, "seamless_clone");

    let mut out = dst.clone();
    let (rw, rh) = (roi_s.width as usize, roi_s.height as usize);
    if rw < 3 || rh < 3 {
        // The whole region is boundary
        return Ok(out);
    }

    let channels = dst.channels().min(3);
    let ch_stride = dst.channels();
    let inside: Vec<bool> = (0..rh)
        .flat_map(|y| {
            let row = mask.row(roi_s.y as u32 + y as u32);
            (0..rw).map(move |x| row[roi_s.x as usize + x] != 0)
        })
        .collect();

    let solver = PoissonSolver::new(rw - 2, rh - 2);
    for c in 0..channels {
        let sample = |img: &ImageBuffer, r: &Rect| -> Vec<f64> {
            (0..rh)
                .flat_map(|y| {
                    let row = img.row(r.y as u32 + y as u32);
                    (0..rw).map(move |x| row[(r.x as usize + x) * ch_stride + c] as f64)
                })
                .collect()
        };
        let s = sample(src, &roi_s);
        let d = sample(dst, &roi_d);
        let solved = solver.solve(&guidance_divergence(&s, &d, &inside, rw, rh, mode), &d);

        for y in 1..rh - 1 {
            let row = out.row_mut(roi_d.y as u32 + y as u32);
            for x in 1..rw - 1 {
                let v = solved[(y - 1) * (rw - 2) + (x - 1)];
                row[(roi_d.x as usize + x) * ch_stride + c] = saturate_u8(v);
            }
        }
    }

    Ok(out)
}

/// Divergence of the guidance field over a `rw` x `rh` region.
fn guidance_divergence(
    s: &[f64],
    d: &[f64],
    inside: &[bool],
    rw: usize,
    rh: usize,
    mode: CloneMode,
) -> Vec<f64> {
    let pick = |i: usize, gs: f64, gd: f64| -> f64 {
        if !inside[i] {
            gd
        } else {
            match mode {
                CloneMode::Normal => gs,
                CloneMode::Mixed if gs.abs() > gd.abs() => gs,
                CloneMode::Mixed => gd,
            }
        }
    };

    let mut gx = vec![0.0; rw * rh];
    let mut gy = vec![0.0; rw * rh];
    for y in 0..rh {
        for x in 0..rw {
            let i = y * rw + x;
            if x + 1 < rw {
                gx[i] = pick(i, s[i + 1] - s[i], d[i + 1] - d[i]);
            }
            if y + 1 < rh {
                gy[i] = pick(i, s[i + rw] - s[i], d[i + rw] - d[i]);
            }
        }
    }

    let mut div = vec![0.0; rw * rh];
    for y in 0..rh {
        for x in 0..rw {
            let i = y * rw + x;
            let left = if x > 0 { gx[i - 1] } else { 0.0 };
            let up = if y > 0 { gy[i - rw] } else { 0.0 };
            div[i] = gx[i] - left + gy[i] - up;
        }
    }
    div
}

/// DST-I of length `n` through a complex FFT of length `2(n + 1)`.
struct Dst1 {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl Dst1 {
    fn new(n: usize, planner: &mut FftPlanner<f64>) -> Self {
        Self {
            n,
            fft: planner.plan_fft_forward(2 * (n + 1)),
        }
    }

    /// In place: `x[k] <- sum_j x[j] * sin(pi (j+1)(k+1) / (n+1))`.
    fn apply(&self, x: &mut [f64], buf: &mut [Complex<f64>]) {
        let n = self.n;
        buf.fill(Complex::new(0.0, 0.0));
        for j in 0..n {
            buf[j + 1] = Complex::new(x[j], 0.0);
            buf[2 * (n + 1) - 1 - j] = Complex::new(-x[j], 0.0);
        }
        self.fft.process(buf);
        for k in 0..n {
            x[k] = -buf[k + 1].im / 2.0;
        }
    }
}

/// Exact solver for the 5-point Poisson equation on an `m` x `n` interior.
struct PoissonSolver {
    m: usize,
    n: usize,
    row_dst: Dst1,
    col_dst: Dst1,
    eigen: Vec<f64>,
}

impl PoissonSolver {
    fn new(m: usize, n: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_dst = Dst1::new(m, &mut planner);
        let col_dst = Dst1::new(n, &mut planner);
        let mut eigen = Vec::with_capacity(m * n);
        for l in 1..=n {
            let ey = 2.0 * (PI * l as f64 / (n + 1) as f64).cos() - 2.0;
            for k in 1..=m {
                let ex = 2.0 * (PI * k as f64 / (m + 1) as f64).cos() - 2.0;
                eigen.push(ex + ey);
            }
        }
        Self {
            m,
            n,
            row_dst,
            col_dst,
            eigen,
        }
    }

    /// Applies DST-I along rows, then columns.
    fn dst2(&self, data: &mut [f64]) {
        let (m, n) = (self.m, self.n);
        let mut buf = vec![Complex::new(0.0, 0.0); 2 * (m.max(n) + 1)];
        for row in data.chunks_exact_mut(m) {
            self.row_dst.apply(row, &mut buf[..2 * (m + 1)]);
        }
        let mut col = vec![0.0; n];
        for x in 0..m {
            for y in 0..n {
                col[y] = data[y * m + x];
            }
            self.col_dst.apply(&mut col, &mut buf[..2 * (n + 1)]);
            for y in 0..n {
                data[y * m + x] = col[y];
            }
        }
    }

    /// Solves `laplace(u) = div` on the interior of a `(m+2)` x `(n+2)`
    /// region whose outer ring is fixed to `boundary`.
    ///
    /// `div` and `boundary` cover the full region; the result covers the
    /// interior only.
    fn solve(&self, div: &[f64], boundary: &[f64]) -> Vec<f64> {
        let (m, n) = (self.m, self.n);
        let rw = m + 2;
        trace!(m, n, "poisson solve");

        let mut rhs = vec![0.0; m * n];
        for y in 0..n {
            for x in 0..m {
                let (rx, ry) = (x + 1, y + 1);
                let mut v = div[ry * rw + rx];
                if x == 0 {
                    v -= boundary[ry * rw];
                }
                if x == m - 1 {
                    v -= boundary[ry * rw + rw - 1];
                }
                if y == 0 {
                    v -= boundary[rx];
                }
                if y == n - 1 {
                    v -= boundary[(n + 1) * rw + rx];
                }
                rhs[y * m + x] = v;
            }
        }

        self.dst2(&mut rhs);
        for (v, e) in rhs.iter_mut().zip(&self.eigen) {
            *v /= e;
        }
        self.dst2(&mut rhs);

        let scale = (2.0 / (m + 1) as f64) * (2.0 / (n + 1) as f64);
        rhs.iter_mut().for_each(|v| *v *= scale);
        rhs
    }
}
