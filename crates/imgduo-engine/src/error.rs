//! Operator outcomes that leave the session unchanged or partially reset.

use crate::enablement::Operator;
use crate::store::Slot;
use imgduo_io::IoError;
use imgduo_ops::{OpsError, StitchStatus};
use std::fmt;
use thiserror::Error;

/// Which images an operator was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// The primary image is not loaded.
    Primary,
    /// The secondary image is not loaded.
    Secondary,
    /// Neither image is loaded.
    Both,
}

impl Missing {
    /// Derives the missing set from slot validity, `None` if nothing is missing.
    pub fn from_validity(primary: bool, secondary: bool) -> Option<Self> {
        match (primary, secondary) {
            (true, true) => None,
            (false, true) => Some(Self::Primary),
            (true, false) => Some(Self::Secondary),
            (false, false) => Some(Self::Both),
        }
    }

    /// User-facing hint naming the image(s) to load.
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Primary => "load the first image",
            Self::Secondary => "load the second image",
            Self::Both => "both images required",
        }
    }
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

/// Why an algorithm gave up.
#[derive(Debug, Error)]
pub enum Failure {
    /// Panorama assembly returned a non-OK status.
    #[error("stitching failed: {0}")]
    Stitch(StitchStatus),

    /// Any other algorithm error.
    #[error(transparent)]
    Algorithm(OpsError),
}

impl From<OpsError> for Failure {
    fn from(err: OpsError) -> Self {
        match err.stitch_status() {
            Some(status) => Self::Stitch(status),
            None => Self::Algorithm(err),
        }
    }
}

/// Error type for engine operations.
///
/// No variant is fatal to the session: every failed operation either
/// leaves the slots untouched or, for decode failures, empties only the
/// target slot.
#[derive(Debug, Error)]
#[must_use]
pub enum EngineError {
    /// The file could not be decoded; the target slot was released.
    #[error("decode failed for {slot} image: {source}")]
    Decode {
        /// Slot the load targeted.
        slot: Slot,
        /// Underlying decoder error.
        #[source]
        source: IoError,
    },

    /// Preconditions not met; nothing was mutated.
    #[error("{operator} rejected: {missing}")]
    Rejected {
        /// Operator that was refused.
        operator: Operator,
        /// Images it needed.
        missing: Missing,
    },

    /// The algorithm ran and failed; nothing was mutated.
    #[error("{operator} failed: {failure}")]
    Failed {
        /// Operator that failed.
        operator: Operator,
        /// Cause.
        #[source]
        failure: Failure,
    },

    /// A buffer has a layout the operation cannot handle.
    #[error("unsupported format: {0}")]
    Unsupported(String),
}

impl EngineError {
    /// True for precondition rejections.
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// True for algorithm failures.
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Stitcher status code carried by a failed stitch.
    pub const fn stitch_status(&self) -> Option<StitchStatus> {
        match self {
            Self::Failed {
                failure: Failure::Stitch(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn failed(operator: Operator, err: OpsError) -> Self {
        if let OpsError::Unsupported(msg) = err {
            return Self::Unsupported(msg);
        }
        Self::Failed {
            operator,
            failure: Failure::from(err),
        }
    }
}

impl From<imgduo_core::Error> for EngineError {
    fn from(err: imgduo_core::Error) -> Self {
        Self::Unsupported(err.to_string())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
