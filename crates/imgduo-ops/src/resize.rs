//! Image resize and resampling operations.
//!
//! Bilinear resampling with half-pixel centers: destination pixel `d` samples
//! source position `(d + 0.5) * scale - 0.5`, clamped to the edge pixels.
//! Aspect ratio is whatever the caller asks for.
//!
//! # Example
//!
//! ```rust
//! use imgduo_core::{ImageBuffer, PixelType};
//! use imgduo_ops::resize::resize_bilinear;
//!
//! let src = ImageBuffer::filled(150, 100, PixelType::Bgr8, &[9, 9, 9]).unwrap();
//! let dst = resize_bilinear(&src, 300, 200).unwrap();
//! assert_eq!(dst.dimensions(), (300, 200));
//! ```

use crate::{ensure_valid, saturate_u8, OpsError, OpsResult};
use imgduo_core::ImageBuffer;
use rayon::prelude::*;
use tracing::trace;

/// Source taps for one destination coordinate.
#[derive(Debug, Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f64,
}

fn taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let f = (d as f64 + 0.5) * scale - 0.5;
            let mut i0 = f.floor();
            let mut frac = f - i0;
            if i0 < 0.0 {
                i0 = 0.0;
                frac = 0.0;
            }
            let mut i0 = i0 as usize;
            if i0 >= src_len - 1 {
                i0 = src_len - 1;
                frac = 0.0;
            }
            Tap {
                i0,
                i1: (i0 + 1).min(src_len - 1),
                frac,
            }
        })
        .collect()
}

/// Resizes to exactly `width` x `height` with bilinear interpolation.
///
/// Same-size input is returned as a deep copy.
///
/// # Errors
///
/// Returns [`OpsError::InvalidDimensions`] for an empty image or a zero
/// target size.
pub fn resize_bilinear(image: &ImageBuffer, width: u32, height: u32) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "resize")?;
    if width == 0 || height == 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "resize target {width}x{height}"
        )));
    }
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    trace!(src_w = image.width(), src_h = image.height(), width, height, "resize_bilinear");

    let channels = image.channels();
    let src_row = image.row_bytes();
    let packed = image.as_packed();
    let src: &[u8] = &packed;
    let xs = taps(image.width() as usize, width as usize);
    let ys = taps(image.height() as usize, height as usize);

    let dst_row = width as usize * channels;
    let mut dst = vec![0u8; dst_row * height as usize];
    dst.par_chunks_mut(dst_row).zip(ys.par_iter()).for_each(|(out, ty)| {
        let r0 = &src[ty.i0 * src_row..][..src_row];
        let r1 = &src[ty.i1 * src_row..][..src_row];
        for (x, tx) in xs.iter().enumerate() {
            for c in 0..channels {
                let a = r0[tx.i0 * channels + c] as f64;
                let b = r0[tx.i1 * channels + c] as f64;
                let top = a + (b - a) * tx.frac;
                let a = r1[tx.i0 * channels + c] as f64;
                let b = r1[tx.i1 * channels + c] as f64;
                let bottom = a + (b - a) * tx.frac;
                out[x * channels + c] = saturate_u8(top + (bottom - top) * ty.frac);
            }
        }
    });

    Ok(ImageBuffer::from_raw(width, height, image.pixel_type(), dst)?)
}
