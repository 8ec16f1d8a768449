//! Pixel type conversion.
//!
//! | From \ To | Gray8 | Bgr8 | Bgra8 |
//! |-----------|-------|------|-------|
//! | Gray8 | copy | replicate | replicate, alpha 255 |
//! | Bgr8 | luminance | copy | alpha 255 |
//! | Bgra8 | luminance (alpha ignored) | drop alpha | copy |
//!
//! Luminance uses [`imgduo_core::bgr_to_gray`].

use crate::{ensure_valid, OpsResult};
use imgduo_core::{bgr_to_gray, ImageBuffer, PixelType};
use tracing::trace;

/// Converts `image` to `target`, returning a deep copy when the type already matches.
pub fn convert(image: &ImageBuffer, target: PixelType) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "convert")?;
    let source = image.pixel_type();
    if source == target {
        return Ok(image.clone());
    }
    trace!(%source, %target, "convert");

    let src = image.as_packed();
    let src_ch = source.channels();
    let mut out = Vec::with_capacity(image.pixel_count() * target.channels());
    for px in src.chunks_exact(src_ch) {
        match (source, target) {
            (PixelType::Gray8, PixelType::Bgr8) => out.extend_from_slice(&[px[0]; 3]),
            (PixelType::Gray8, PixelType::Bgra8) => {
                out.extend_from_slice(&[px[0], px[0], px[0], 255])
            }
            (_, PixelType::Gray8) => out.push(bgr_to_gray(px[0], px[1], px[2])),
            (PixelType::Bgr8, PixelType::Bgra8) => out.extend_from_slice(&[px[0], px[1], px[2], 255]),
            (PixelType::Bgra8, PixelType::Bgr8) => out.extend_from_slice(&px[..3]),
            // Equal types returned above
            _ => out.extend_from_slice(px),
        }
    }

    Ok(ImageBuffer::from_raw(image.width(), image.height(), target, out)?)
}

/// Reduces to one luminance channel; 1-channel input is copied.
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_ops::color::to_gray;
///
/// let red = ImageBuffer::filled(2, 2, PixelType::Bgr8, &[0, 0, 255]).unwrap();
/// assert_eq!(to_gray(&red).unwrap().pixel(0, 0), &[76]);
/// ```
pub fn to_gray(image: &ImageBuffer) -> OpsResult<ImageBuffer> {
    convert(image, PixelType::Gray8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_is_idempotent() {
        let mut img = ImageBuffer::new(3, 2, PixelType::Gray8).unwrap();
        img.set_pixel(1, 1, &[42]);
        let once = to_gray(&img).unwrap();
        let twice = to_gray(&once).unwrap();
        assert_eq!(once, img);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_gray_from_bgra_ignores_alpha() {
        let a = ImageBuffer::filled(1, 1, PixelType::Bgra8, &[10, 200, 30, 0]).unwrap();
        let b = ImageBuffer::filled(1, 1, PixelType::Bgra8, &[10, 200, 30, 255]).unwrap();
        assert_eq!(to_gray(&a).unwrap(), to_gray(&b).unwrap());
    }

    #[test]
    fn test_expand_and_drop_alpha() {
        let gray = ImageBuffer::filled(2, 1, PixelType::Gray8, &[9]).unwrap();
        let bgra = convert(&gray, PixelType::Bgra8).unwrap();
        assert_eq!(bgra.pixel(1, 0), &[9, 9, 9, 255]);

        let bgr = convert(&bgra, PixelType::Bgr8).unwrap();
        assert_eq!(bgr.pixel(0, 0), &[9, 9, 9]);
        assert_eq!(convert(&bgr, PixelType::Gray8).unwrap(), gray);
    }

    #[test]
    fn test_same_type_is_copy() {
        let img = ImageBuffer::filled(2, 2, PixelType::Bgr8, &[1, 2, 3]).unwrap();
        assert_eq!(convert(&img, PixelType::Bgr8).unwrap(), img);
    }
}
