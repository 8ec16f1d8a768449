//! Weighted addition of two same-shape images.
//!
//! `dst = saturate(round(a * alpha + b * beta + gamma))` per sample, alpha
//! channel included.

use crate::{ensure_valid, saturate_u8, OpsError, OpsResult};
use imgduo_core::ImageBuffer;
use tracing::trace;

/// Weight given to each input by the blend operator.
pub const BLEND_WEIGHT: f64 = 0.5;

/// Computes `a * alpha + b * beta + gamma` per sample.
///
/// # Errors
///
/// Returns [`OpsError::SizeMismatch`] unless both images have the same
/// dimensions and pixel type.
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_ops::composite::add_weighted;
///
/// let a = ImageBuffer::filled(2, 2, PixelType::Gray8, &[100]).unwrap();
/// let b = ImageBuffer::filled(2, 2, PixelType::Gray8, &[200]).unwrap();
/// let mid = add_weighted(&a, 0.5, &b, 0.5, 0.0).unwrap();
/// assert_eq!(mid.pixel(0, 0), &[150]);
/// ```
pub fn add_weighted(
    a: &ImageBuffer,
    alpha: f64,
    b: &ImageBuffer,
    beta: f64,
    gamma: f64,
) -> OpsResult<ImageBuffer> {
    ensure_valid(a, "add_weighted")?;
    ensure_valid(b, "add_weighted")?;
    if !a.same_shape(b) {
        return Err(OpsError::SizeMismatch(format!(
            "{}x{} {} vs {}x{} {}",
            a.width(),
            a.height(),
            a.pixel_type(),
            b.width(),
            b.height(),
            b.pixel_type()
        )));
    }
    trace!(alpha, beta, gamma, "add_weighted");

    let pa = a.as_packed();
    let pb = b.as_packed();
    let data = pa
        .iter()
        .zip(pb.iter())
        .map(|(&x, &y)| saturate_u8(x as f64 * alpha + y as f64 * beta + gamma))
        .collect();
    Ok(ImageBuffer::from_raw(a.width(), a.height(), a.pixel_type(), data)?)
}

/// Equal-weight blend of two same-shape images.
pub fn blend_equal(a: &ImageBuffer, b: &ImageBuffer) -> OpsResult<ImageBuffer> {
    add_weighted(a, BLEND_WEIGHT, b, 1.0 - BLEND_WEIGHT, 0.0)
}
