//! Error types for I/O operations.
//!
//! Provides unified error handling for all image format operations.

use std::io;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Unsupported bit depth or color layout inside a known format.
    #[error("unsupported bit depth: {0}")]
    UnsupportedBitDepth(String),

    /// Decoded samples could not be wrapped into a buffer.
    #[error("buffer error: {0}")]
    Buffer(#[from] imgduo_core::Error),
}

impl IoError {
    /// Returns `true` if the failure means "this is not an image we handle",
    /// as opposed to a missing file or a corrupt one.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Self::UnsupportedFormat(_) | Self::UnsupportedBitDepth(_) => true,
            Self::Buffer(e) => e.is_unsupported_format(),
            _ => false,
        }
    }
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
