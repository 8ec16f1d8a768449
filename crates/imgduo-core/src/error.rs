//! Error types for imgduo-core operations.
//!
//! The [`Error`] enum covers the failure modes of buffer construction and
//! access: bad dimensions, strides that cannot hold a row, storage that is
//! too short, and channel layouts outside the supported set.
//!
//! # Usage
//!
//! ```rust
//! use imgduo_core::{Error, Result};
//!
//! fn check_channels(n: u8) -> Result<()> {
//!     match n {
//!         1 | 3 | 4 => Ok(()),
//!         other => Err(Error::unsupported_format(format!("{other} channels"))),
//!     }
//! }
//! assert!(check_channels(2).is_err());
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or addressing an [`ImageBuffer`](crate::ImageBuffer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pixel coordinates are outside image bounds.
    #[error("pixel ({x}, {y}) out of bounds for image {width}x{height}")]
    OutOfBounds {
        /// X coordinate that was out of bounds
        x: u32,
        /// Y coordinate that was out of bounds
        y: u32,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Channel count or sample depth outside the supported set.
    ///
    /// Only 8-bit unsigned samples with 1, 3 or 4 channels are supported.
    #[error("unsupported pixel format: {format}")]
    UnsupportedFormat {
        /// Format name or description
        format: String,
    },

    /// Invalid image dimensions.
    ///
    /// Returned when exactly one of width/height is zero, or when the
    /// buffer size computation would overflow.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Stride is too small for the given width and pixel size.
    #[error("stride {stride} is less than minimum {min_stride} for width {width}")]
    InvalidStride {
        /// Provided stride
        stride: usize,
        /// Minimum required stride
        min_stride: usize,
        /// Image width
        width: u32,
    },

    /// Backing storage is shorter than `height * stride`.
    #[error("buffer holds {actual} bytes, {required} required")]
    BufferTooSmall {
        /// Bytes required by the layout
        required: usize,
        /// Bytes actually supplied
        actual: usize,
    },
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] error.
    #[inline]
    pub fn out_of_bounds(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Returns `true` if this error means the pixel layout itself is unsupported.
    #[inline]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds() {
        let err = Error::out_of_bounds(100, 50, 80, 60);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("80x60"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = Error::unsupported_format("2 channels");
        assert!(err.is_unsupported_format());
        assert!(err.to_string().contains("2 channels"));
    }

    #[test]
    fn test_buffer_too_small_message() {
        let err = Error::BufferTooSmall {
            required: 300,
            actual: 12,
        };
        assert_eq!(err.to_string(), "buffer holds 12 bytes, 300 required");
    }
}
