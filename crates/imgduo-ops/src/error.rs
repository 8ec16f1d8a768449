//! Error types for image operations.

use crate::stitch::StitchStatus;
use thiserror::Error;

/// Error type for image operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Images have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operation not supported for this format.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Panorama assembly stopped with a non-OK status.
    #[error("stitching failed: {0}")]
    Stitch(StitchStatus),

    /// Result buffer could not be built.
    #[error(transparent)]
    Image(#[from] imgduo_core::Error),
}

impl OpsError {
    /// Returns the stitcher status if this is a stitching failure.
    pub fn stitch_status(&self) -> Option<StitchStatus> {
        match self {
            Self::Stitch(status) => Some(*status),
            _ => None,
        }
    }
}

/// Result type for image operations.
pub type OpsResult<T> = Result<T, OpsError>;
