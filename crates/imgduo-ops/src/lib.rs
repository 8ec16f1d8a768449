//! # imgduo-ops
//!
//! Pixel algorithms behind every imgduo operator.
//!
//! All functions are pure: they borrow an [`ImageBuffer`] and return a new
//! one. Nothing here knows about slots or enablement.
//!
//! # Modules
//!
//! - [`filter`] - Convolution (sharpen) and bilateral smoothing
//! - [`color`] - Pixel type conversion and luminance reduction
//! - [`edge`] - Sobel gradients and Canny edge detection
//! - [`lut`] - 256-entry lookup tables (gamma)
//! - [`resize`] - Bilinear resampling
//! - [`composite`] - Weighted addition
//! - [`clone`] - Poisson seamless cloning
//! - [`stitch`] - Two-image panorama assembly
//!
//! # Example
//!
//! ```rust
//! use imgduo_core::{ImageBuffer, PixelType};
//! use imgduo_ops::{filter, lut};
//!
//! let img = ImageBuffer::filled(8, 8, PixelType::Bgr8, &[64, 128, 192]).unwrap();
//! let sharp = filter::sharpen(&img).unwrap();
//! assert_eq!(sharp, img); // flat input is a fixed point
//!
//! let bright = lut::gamma(&img, lut::GAMMA).unwrap();
//! assert!(bright.pixel(0, 0)[0] > 64);
//! ```
//!
//! # Border Handling
//!
//! Neighborhood filters read outside the image through reflect-101
//! (`gfedcb|abcdefgh|gfedcba`) unless noted. Gradients for edge detection
//! and corner detection replicate the edge pixel instead.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod clone;
pub mod color;
pub mod composite;
pub mod edge;
pub mod filter;
pub mod lut;
pub mod resize;
pub mod stitch;

pub use error::{OpsError, OpsResult};
pub use clone::CloneMode;
pub use lut::Lut;
pub use stitch::{StitchStatus, Stitcher};

use imgduo_core::ImageBuffer;

/// Fails with [`OpsError::InvalidDimensions`] for an empty buffer.
pub(crate) fn ensure_valid(image: &ImageBuffer, what: &str) -> OpsResult<()> {
    if image.is_valid() {
        Ok(())
    } else {
        Err(OpsError::InvalidDimensions(format!("{what}: empty image")))
    }
}

/// Rounds half to even and clamps to the `u8` range.
#[inline]
pub(crate) fn saturate_u8(v: f64) -> u8 {
    v.round_ties_even().clamp(0.0, 255.0) as u8
}
