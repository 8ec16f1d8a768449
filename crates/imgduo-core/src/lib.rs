//! # imgduo-core
//!
//! Core types for the imgduo two-slot image editing engine.
//!
//! This crate provides the foundational types used by every other imgduo crate:
//!
//! - [`ImageBuffer`] - Owned 8-bit pixel grid with explicit row stride
//! - [`PixelType`] - Channel layout of a buffer (`Gray8`, `Bgr8`, `Bgra8`)
//! - [`Error`] / [`Result`] - Buffer construction and access errors
//!
//! ## Channel Order
//!
//! Buffers use the *native* channel order produced by the decoder: three
//! channel buffers are stored as `B G R`, four channel buffers as `B G R A`.
//! Conversion to display order happens only at the display boundary.
//!
//! ```rust
//! use imgduo_core::{ImageBuffer, PixelType};
//!
//! let img = ImageBuffer::filled(4, 2, PixelType::Bgr8, &[255, 0, 0]).unwrap();
//! assert_eq!(img.pixel(0, 0), &[255, 0, 0]); // pure blue
//! assert!(img.is_valid());
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//! imgduo-core (this crate)
//!    ^
//!    +-- imgduo-io (decode / encode)
//!    +-- imgduo-ops (pixel algorithms)
//!    +-- imgduo-engine (slots, operators, enablement)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod pixel;

pub use error::*;
pub use image::*;
pub use pixel::*;

/// Prelude module for convenient imports.
///
/// ```
/// use imgduo_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::ImageBuffer;
    pub use crate::pixel::{bgr_to_gray, PixelType};
}
