//! Planar homography estimation.
//!
//! [`Homography::fit`] solves the direct linear transform on
//! Hartley-normalized points; [`ransac`] wraps it with random 4-point
//! sampling and a final refit on the consensus set.

use nalgebra::{Matrix3, SMatrix, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::trace;

/// Minimum correspondences for a homography.
pub const MIN_POINTS: usize = 4;

/// A 3x3 projective transform, normalized so that `h[2][2] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    /// Identity transform.
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// Wraps a matrix, rescaling it so the bottom-right entry is 1.
    ///
    /// Returns `None` if that entry is (near) zero or anything is non-finite.
    pub fn from_matrix(m: Matrix3<f64>) -> Option<Self> {
        let w = m[(2, 2)];
        if w.abs() < 1e-12 || !m.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self(m / w))
    }

    /// Underlying matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Maps a point. `None` for points sent to infinity.
    pub fn project(&self, (x, y): (f64, f64)) -> Option<(f64, f64)> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p.z.abs() < 1e-12 {
            return None;
        }
        let q = (p.x / p.z, p.y / p.z);
        (q.0.is_finite() && q.1.is_finite()).then_some(q)
    }

    /// Inverse transform.
    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().and_then(Self::from_matrix)
    }

    /// Rejects mirrored, collapsed or strongly perspective transforms.
    pub fn is_well_conditioned(&self) -> bool {
        let m = &self.0;
        let det2 = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
        let perspective = m[(2, 0)].abs().max(m[(2, 1)].abs());
        det2.is_finite() && (0.1..=10.0).contains(&det2) && perspective < 0.01
    }

    /// Least-squares fit mapping `src[i]` to `dst[i]`.
    ///
    /// Needs at least [`MIN_POINTS`] pairs; returns `None` for degenerate
    /// input (coincident points, all points on one line, etc.).
    pub fn fit(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Option<Self> {
        if src.len() != dst.len() || src.len() < MIN_POINTS {
            return None;
        }
        let ts = normalizer(src)?;
        let td = normalizer(dst)?;

        let mut ata = SMatrix::<f64, 9, 9>::zeros();
        for (&s, &d) in src.iter().zip(dst) {
            let s = ts * Vector3::new(s.0, s.1, 1.0);
            let d = td * Vector3::new(d.0, d.1, 1.0);
            let (x, y, u, v) = (s.x, s.y, d.x, d.y);
            let r1 = SMatrix::<f64, 9, 1>::from_column_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]);
            let r2 = SMatrix::<f64, 9, 1>::from_column_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]);
            ata += r1 * r1.transpose() + r2 * r2.transpose();
        }

        let svd = ata.svd(false, true);
        let v_t = svd.v_t?;
        let (idx, _) = svd
            .singular_values
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))?;
        let h = v_t.row(idx);
        let hn = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
        let m = td.try_inverse()? * hn * ts;
        Self::from_matrix(m)
    }
}

/// Similarity moving the centroid to the origin with mean distance sqrt(2).
fn normalizer(points: &[(f64, f64)]) -> Option<Matrix3<f64>> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
    let mean = points
        .iter()
        .map(|p| ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !(mean.is_finite() && mean > 1e-9) {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean;
    Some(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

/// RANSAC settings.
#[derive(Debug, Clone)]
pub struct RansacParams {
    /// Reprojection error, in pixels, below which a pair is an inlier.
    pub threshold: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Desired probability of drawing at least one all-inlier sample.
    pub confidence: f64,
    /// Sampler seed, so results are reproducible.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0x57_17C4,
        }
    }
}

/// Result of [`ransac`].
#[derive(Debug, Clone)]
pub struct RansacFit {
    /// Model refit on the consensus set.
    pub homography: Homography,
    /// Per-pair inlier flags.
    pub inliers: Vec<bool>,
    /// Number of `true` flags.
    pub inlier_count: usize,
}

fn score(h: &Homography, src: &[(f64, f64)], dst: &[(f64, f64)], threshold: f64) -> (Vec<bool>, usize) {
    let t2 = threshold * threshold;
    let flags: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(&s, &d)| {
            h.project(s)
                .is_some_and(|p| (p.0 - d.0).powi(2) + (p.1 - d.1).powi(2) < t2)
        })
        .collect();
    let count = flags.iter().filter(|&&f| f).count();
    (flags, count)
}

/// True if any three of the points are (nearly) collinear.
fn degenerate(points: &[(f64, f64)]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let (a, b, c) = (points[i], points[j], points[k]);
                let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
                if cross.abs() < 1.0 {
                    return true;
                }
            }
        }
    }
    false
}

/// Robust homography mapping `src` onto `dst`.
///
/// The iteration count shrinks as better models are found, following the
/// usual `log(1 - confidence) / log(1 - w^4)` bound. Returns `None` when no
/// sample produced a model.
pub fn ransac(src: &[(f64, f64)], dst: &[(f64, f64)], params: &RansacParams) -> Option<RansacFit> {
    let n = src.len();
    if n != dst.len() || n < MIN_POINTS {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<(Homography, Vec<bool>, usize)> = None;
    let mut limit = params.max_iterations;
    let mut iter = 0;

    while iter < limit {
        iter += 1;
        let idx = rand::seq::index::sample(&mut rng, n, MIN_POINTS).into_vec();
        let s: Vec<(f64, f64)> = idx.iter().map(|&i| src[i]).collect();
        let d: Vec<(f64, f64)> = idx.iter().map(|&i| dst[i]).collect();
        if degenerate(&s) || degenerate(&d) {
            continue;
        }
        let Some(h) = Homography::fit(&s, &d) else {
            continue;
        };
        let (flags, count) = score(&h, src, dst, params.threshold);
        if best.as_ref().is_none_or(|b| count > b.2) {
            let w = count as f64 / n as f64;
            let miss = 1.0 - w.powi(MIN_POINTS as i32);
            if miss <= f64::EPSILON {
                limit = iter;
            } else {
                let needed = ((1.0 - params.confidence).ln() / miss.ln()).ceil();
                if needed.is_finite() && needed >= 0.0 {
                    limit = limit.min(needed as usize);
                }
            }
            best = Some((h, flags, count));
        }
    }

    let (model, flags, count) = best?;
    let (in_src, in_dst): (Vec<_>, Vec<_>) = src
        .iter()
        .zip(dst)
        .zip(&flags)
        .filter(|(_, f)| **f)
        .map(|((&s, &d), _)| (s, d))
        .unzip();

    let refit = Homography::fit(&in_src, &in_dst)
        .map(|h| {
            let (f, c) = score(&h, src, dst, params.threshold);
            (h, f, c)
        })
        .filter(|r| r.2 >= count);
    let (homography, inliers, inlier_count) = refit.unwrap_or((model, flags, count));
    trace!(iterations = iter, inliers = inlier_count, total = n, "ransac");
    Some(RansacFit {
        homography,
        inliers,
        inlier_count,
    })
}
