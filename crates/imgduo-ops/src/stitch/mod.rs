//! Panorama stitching.
//!
//! Registers one image onto another with a planar homography and blends
//! both onto a shared canvas.
//!
//! # Pipeline
//!
//! ```text
//! primary, secondary
//!     |  to_gray
//!     v
//! Harris corners + 256-bit binary descriptors     (features)
//!     |
//!     v
//! Hamming matching, ratio test, cross-check       (matching)
//!     |
//!     v
//! RANSAC over normalized DLT, refit on inliers    (homography)
//!     |
//!     v
//! Canvas = union of bounds, feathered blend       (compose)
//! ```
//!
//! Every stage can stop the pipeline with a [`StitchStatus`]. Nothing is
//! partially returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgduo_ops::stitch::Stitcher;
//!
//! let pano = Stitcher::default().stitch(&[left, right])?;
//! ```

pub mod compose;
pub mod features;
pub mod homography;
pub mod matching;

use crate::color::{convert, to_gray};
use crate::{ensure_valid, OpsError, OpsResult};
use homography::{Homography, RansacParams};
use imgduo_core::ImageBuffer;
use std::fmt;
use tracing::{debug, warn};

/// Outcome codes of a stitching attempt.
///
/// Numeric values follow the conventional panorama-stitcher codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StitchStatus {
    /// Panorama assembled.
    Ok = 0,
    /// Not enough distinctive features or matches to relate the images.
    NeedMoreImages = 1,
    /// No consistent, non-degenerate homography was found.
    HomographyEstimationFailed = 2,
    /// The estimated transform yields an unusable canvas.
    CameraParamsAdjustFailed = 3,
}

impl StitchStatus {
    /// Numeric status code.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for StitchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::NeedMoreImages => "need more images",
            Self::HomographyEstimationFailed => "homography estimation failed",
            Self::CameraParamsAdjustFailed => "camera parameters adjustment failed",
        };
        write!(f, "{text} (code {})", self.code())
    }
}

/// Maximum number of corners kept per image.
pub const MAX_FEATURES: usize = 1000;

/// Lowe ratio between best and second best match distance.
pub const MATCH_RATIO: f32 = 0.75;

/// Minimum RANSAC inliers for a usable model.
pub const MIN_INLIERS: usize = 12;

/// Minimum inlier share among matches.
pub const MIN_INLIER_RATIO: f64 = 0.25;

/// Largest accepted canvas area relative to the summed input areas.
pub const MAX_CANVAS_SCALE: f64 = 8.0;

/// Stitching configuration.
///
/// Defaults are the fixed operator constants.
#[derive(Debug, Clone)]
pub struct Stitcher {
    /// Corner cap per image.
    pub max_features: usize,
    /// Ratio test threshold.
    pub match_ratio: f32,
    /// RANSAC settings.
    pub ransac: RansacParams,
    /// Minimum inlier count.
    pub min_inliers: usize,
    /// Minimum inlier ratio.
    pub min_inlier_ratio: f64,
    /// Canvas area limit, as a multiple of the input areas.
    pub max_canvas_scale: f64,
}

impl Default for Stitcher {
    fn default() -> Self {
        Self {
            max_features: MAX_FEATURES,
            match_ratio: MATCH_RATIO,
            ransac: RansacParams::default(),
            min_inliers: MIN_INLIERS,
            min_inlier_ratio: MIN_INLIER_RATIO,
            max_canvas_scale: MAX_CANVAS_SCALE,
        }
    }
}

impl Stitcher {
    /// Stitches `images` in order: each one is registered onto the panorama
    /// built so far. The result has the first image's pixel type.
    ///
    /// # Errors
    ///
    /// [`OpsError::Stitch`] carrying the failing stage's status; fewer than
    /// two images is [`StitchStatus::NeedMoreImages`].
    pub fn stitch(&self, images: &[ImageBuffer]) -> OpsResult<ImageBuffer> {
        let Some((first, rest)) = images.split_first() else {
            return Err(OpsError::Stitch(StitchStatus::NeedMoreImages));
        };
        if rest.is_empty() {
            return Err(OpsError::Stitch(StitchStatus::NeedMoreImages));
        }
        let mut pano = first.clone();
        for next in rest {
            pano = self.stitch_pair(&pano, next)?;
        }
        Ok(pano)
    }

    /// Registers `secondary` onto `primary` and blends both.
    pub fn stitch_pair(&self, primary: &ImageBuffer, secondary: &ImageBuffer) -> OpsResult<ImageBuffer> {
        ensure_valid(primary, "stitch primary")?;
        ensure_valid(secondary, "stitch secondary")?;
        let secondary = convert(secondary, primary.pixel_type())?;

        let h = self.estimate(primary, &secondary).map_err(|status| {
            warn!(%status, "stitch: registration failed");
            OpsError::Stitch(status)
        })?;
        compose::compose(primary, &secondary, &h, self.max_canvas_scale).map_err(|status| {
            warn!(%status, "stitch: composition failed");
            OpsError::Stitch(status)
        })
    }

    /// Estimates the homography mapping `secondary` pixels into `primary`.
    pub fn estimate(
        &self,
        primary: &ImageBuffer,
        secondary: &ImageBuffer,
    ) -> Result<Homography, StitchStatus> {
        let gray_p = to_gray(primary).map_err(|_| StitchStatus::NeedMoreImages)?;
        let gray_s = to_gray(secondary).map_err(|_| StitchStatus::NeedMoreImages)?;

        let feats_p = features::detect_and_describe(&gray_p, self.max_features);
        let feats_s = features::detect_and_describe(&gray_s, self.max_features);
        debug!(primary = feats_p.len(), secondary = feats_s.len(), "stitch: features");
        if feats_p.len() < self.min_inliers || feats_s.len() < self.min_inliers {
            return Err(StitchStatus::NeedMoreImages);
        }

        let matches = matching::match_features(&feats_s, &feats_p, self.match_ratio);
        debug!(matches = matches.len(), "stitch: matches");
        if matches.len() < self.min_inliers {
            return Err(StitchStatus::NeedMoreImages);
        }

        let src: Vec<(f64, f64)> = matches
            .iter()
            .map(|m| feats_s[m.query].keypoint.position())
            .collect();
        let dst: Vec<(f64, f64)> = matches
            .iter()
            .map(|m| feats_p[m.train].keypoint.position())
            .collect();

        let fit = homography::ransac(&src, &dst, &self.ransac)
            .ok_or(StitchStatus::HomographyEstimationFailed)?;
        let ratio = fit.inlier_count as f64 / matches.len() as f64;
        debug!(inliers = fit.inlier_count, ratio, "stitch: ransac");
        if fit.inlier_count < self.min_inliers || ratio < self.min_inlier_ratio {
            return Err(StitchStatus::HomographyEstimationFailed);
        }
        if !fit.homography.is_well_conditioned() {
            return Err(StitchStatus::HomographyEstimationFailed);
        }
        Ok(fit.homography)
    }
}

/// Stitches two images with default settings.
pub fn stitch(primary: &ImageBuffer, secondary: &ImageBuffer) -> OpsResult<ImageBuffer> {
    Stitcher::default().stitch_pair(primary, secondary)
}
