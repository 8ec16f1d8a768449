//! Image filtering and convolution operations.
//!
//! # Kernels
//!
//! - [`Kernel::sharpen`] - The fixed 4-neighbour sharpening kernel
//!
//! # Filters
//!
//! - [`convolve`] - Generic 2D convolution with reflect-101 borders
//! - [`sharpen`] - [`convolve`] with [`SHARPEN_KERNEL`]
//! - [`bilateral`] - Edge-preserving smoothing
//!
//! # Example
//!
//! ```rust
//! use imgduo_core::{ImageBuffer, PixelType};
//! use imgduo_ops::filter::{convolve, Kernel};
//!
//! let img = ImageBuffer::filled(8, 8, PixelType::Gray8, &[50]).unwrap();
//! let sharpened = convolve(&img, &Kernel::sharpen()).unwrap();
//! assert_eq!(sharpened.pixel(4, 4), &[50]);
//! ```

use crate::{ensure_valid, saturate_u8, OpsError, OpsResult};
use imgduo_core::ImageBuffer;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Sharpening weights, row-major 3x3.
pub const SHARPEN_KERNEL: [f32; 9] = [
    0.0, -1.0, 0.0,
    -1.0, 5.0, -1.0,
    0.0, -1.0, 0.0,
];

/// Bilateral neighbourhood diameter in pixels.
pub const BILATERAL_DIAMETER: u32 = 9;

/// Bilateral range (intensity) sigma.
pub const BILATERAL_SIGMA_COLOR: f64 = 75.0;

/// Bilateral spatial sigma.
pub const BILATERAL_SIGMA_SPACE: f64 = 75.0;

/// Convolution kernel for image filtering.
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Kernel weights.
    pub data: Vec<f32>,
    /// Kernel width (must be odd).
    pub width: usize,
    /// Kernel height (must be odd).
    pub height: usize,
}

impl Kernel {
    /// The fixed sharpening kernel ([`SHARPEN_KERNEL`]).
    ///
    /// ```rust
    /// use imgduo_ops::filter::Kernel;
    ///
    /// let k = Kernel::sharpen();
    /// assert_eq!(k.data.iter().sum::<f32>(), 1.0);
    /// ```
    pub fn sharpen() -> Self {
        Self {
            data: SHARPEN_KERNEL.to_vec(),
            width: 3,
            height: 3,
        }
    }

    /// Returns the kernel radius (half-size).
    #[inline]
    pub fn radius(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }
}

/// Maps an out-of-range index back into `0..n` by reflect-101.
///
/// `-1 -> 1`, `n -> n - 2`. A single-pixel axis always maps to 0.
#[inline]
pub(crate) fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}

/// Clamps an index into `0..n` (replicate border).
#[inline]
pub(crate) fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

/// Applies a convolution kernel to every channel.
///
/// Borders are reflect-101. Results are rounded and saturated to `u8`, and
/// the output has the input's pixel type.
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_ops::filter::{convolve, Kernel};
///
/// let img = ImageBuffer::filled(4, 4, PixelType::Bgr8, &[1, 2, 3]).unwrap();
/// let out = convolve(&img, &Kernel::sharpen()).unwrap();
/// assert_eq!(out, img);
/// ```
pub fn convolve(image: &ImageBuffer, kernel: &Kernel) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "convolve")?;
    let (width, height) = (image.width() as usize, image.height() as usize);
    let channels = image.channels();
    trace!(width, height, channels, kernel_w = kernel.width, kernel_h = kernel.height, "convolve");

    let packed = image.as_packed();
    let src: &[u8] = &packed;
    let row_len = width * channels;
    let (rx, ry) = kernel.radius();

    // Non-zero taps only; the sharpen kernel is mostly zeros
    let taps: Vec<(isize, isize, f32)> = (0..kernel.height)
        .flat_map(|ky| (0..kernel.width).map(move |kx| (kx, ky)))
        .filter_map(|(kx, ky)| {
            let w = kernel.data[ky * kernel.width + kx];
            (w != 0.0).then_some((kx as isize - rx as isize, ky as isize - ry as isize, w))
        })
        .collect();

    let mut dst = vec![0u8; row_len * height];
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, out)| {
        let mut sums = vec![0.0f32; channels];
        for x in 0..width {
            sums.iter_mut().for_each(|s| *s = 0.0);
            for &(dx, dy, w) in &taps {
                let sy = reflect101(y as isize + dy, height);
                let sx = reflect101(x as isize + dx, width);
                let idx = sy * row_len + sx * channels;
                for (c, sum) in sums.iter_mut().enumerate() {
                    *sum += src[idx + c] as f32 * w;
                }
            }
            for (c, sum) in sums.iter().enumerate() {
                out[x * channels + c] = saturate_u8(*sum as f64);
            }
        }
    });

    Ok(ImageBuffer::from_raw(image.width(), image.height(), image.pixel_type(), dst)?)
}

/// Sharpens with [`SHARPEN_KERNEL`].
pub fn sharpen(image: &ImageBuffer) -> OpsResult<ImageBuffer> {
    debug!(width = image.width(), height = image.height(), "sharpen");
    convolve(image, &Kernel::sharpen())
}

/// Edge-preserving bilateral filter.
///
/// Each output pixel is the weighted mean of the pixels inside a disc of
/// `diameter`, where a neighbour's weight is the product of a spatial
/// Gaussian (`sigma_space`) and a range Gaussian (`sigma_color`) on the sum
/// of absolute colour differences. Borders are reflect-101. On four channel
/// input the alpha channel is passed through unfiltered.
///
/// # Errors
///
/// Returns [`OpsError::InvalidParameter`] if `diameter` is zero or a sigma is
/// not positive.
pub fn bilateral(
    image: &ImageBuffer,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "bilateral")?;
    if diameter == 0 {
        return Err(OpsError::InvalidParameter("bilateral diameter must be > 0".into()));
    }
    if !(sigma_color > 0.0 && sigma_space > 0.0) {
        return Err(OpsError::InvalidParameter(format!(
            "bilateral sigmas must be positive, got color={sigma_color} space={sigma_space}"
        )));
    }

    let (width, height) = (image.width() as usize, image.height() as usize);
    let channels = image.channels();
    let color_channels = channels.min(3);
    let radius = (diameter / 2) as isize;
    debug!(width, height, channels, diameter, sigma_color, sigma_space, "bilateral");

    let space_coeff = -0.5 / (sigma_space * sigma_space);
    let color_coeff = -0.5 / (sigma_color * sigma_color);

    let mut offsets: Vec<(isize, isize, f32)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f64;
            if r2.sqrt() <= radius as f64 {
                offsets.push((dx, dy, (r2 * space_coeff).exp() as f32));
            }
        }
    }
    let color_weights: Vec<f32> = (0..=255 * color_channels)
        .map(|d| ((d * d) as f64 * color_coeff).exp() as f32)
        .collect();

    let packed = image.as_packed();
    let src: &[u8] = &packed;
    let row_len = width * channels;

    let mut dst = vec![0u8; row_len * height];
    dst.par_chunks_mut(row_len).enumerate().for_each(|(y, out)| {
        for x in 0..width {
            let center = &src[y * row_len + x * channels..][..channels];
            let mut wsum = 0.0f32;
            let mut sums = [0.0f32; 3];
            for &(dx, dy, ws) in &offsets {
                let sy = reflect101(y as isize + dy, height);
                let sx = reflect101(x as isize + dx, width);
                let px = &src[sy * row_len + sx * channels..][..channels];
                let diff: usize = (0..color_channels)
                    .map(|c| (px[c] as i32 - center[c] as i32).unsigned_abs() as usize)
                    .sum();
                let w = ws * color_weights[diff];
                wsum += w;
                for c in 0..color_channels {
                    sums[c] += px[c] as f32 * w;
                }
            }
            let o = &mut out[x * channels..][..channels];
            for c in 0..color_channels {
                o[c] = saturate_u8((sums[c] / wsum) as f64);
            }
            if channels == 4 {
                o[3] = center[3];
            }
        }
    });

    Ok(ImageBuffer::from_raw(image.width(), image.height(), image.pixel_type(), dst)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    #[test]
    fn test_sharpen_kernel_sums_to_one() {
        let k = Kernel::sharpen();
        assert_eq!(k.radius(), (1, 1));
        approx::assert_relative_eq!(k.data.iter().sum::<f32>(), 1.0);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 1), 0);
        assert_eq!(reflect101(-3, 2), 1);
    }

    #[test]
    fn test_sharpen_flat_gray_is_unchanged() {
        let img = ImageBuffer::filled(10, 10, PixelType::Gray8, &[100]).unwrap();
        let out = sharpen(&img).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_sharpen_spike_saturates() {
        let mut img = ImageBuffer::filled(5, 5, PixelType::Gray8, &[100]).unwrap();
        img.set_pixel(2, 2, &[200]);
        let out = sharpen(&img).unwrap();
        // 5*200 - 4*100 = 600 -> 255
        assert_eq!(out.pixel(2, 2), &[255]);
        // 5*100 - 200 - 3*100 = 0
        assert_eq!(out.pixel(2, 1), &[0]);
        assert_eq!(out.pixel(0, 0), &[100]);
    }

    #[test]
    fn test_sharpen_border_reflects() {
        // Column 0 = 10, column 1 = 20; reflect-101 mirrors column 1 into -1
        let mut img = ImageBuffer::new(3, 3, PixelType::Gray8).unwrap();
        for y in 0..3 {
            img.set_pixel(0, y, &[10]);
            img.set_pixel(1, y, &[20]);
            img.set_pixel(2, y, &[30]);
        }
        let out = sharpen(&img).unwrap();
        // 5*10 - 20 - 20 - 10 - 10 = -10 -> 0
        assert_eq!(out.pixel(0, 1), &[0]);
        // 5*20 - 10 - 30 - 20 - 20 = 20
        assert_eq!(out.pixel(1, 1), &[20]);
    }

    #[test]
    fn test_bilateral_flat_is_unchanged() {
        let img = ImageBuffer::filled(12, 9, PixelType::Bgr8, &[30, 60, 90]).unwrap();
        let out = bilateral(&img, BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE)
            .unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_bilateral_preserves_strong_edge() {
        // Left half black, right half white; the range term keeps them apart
        let mut img = ImageBuffer::new(16, 8, PixelType::Gray8).unwrap();
        for y in 0..8 {
            for x in 8..16 {
                img.set_pixel(x, y, &[255]);
            }
        }
        let out = bilateral(&img, 9, 75.0, 75.0).unwrap();
        assert!(out.pixel(7, 4)[0] < 10);
        assert!(out.pixel(8, 4)[0] > 245);
    }

    #[test]
    fn test_bilateral_smooths_noise() {
        let mut img = ImageBuffer::filled(9, 9, PixelType::Gray8, &[100]).unwrap();
        img.set_pixel(4, 4, &[130]);
        let out = bilateral(&img, 9, 75.0, 75.0).unwrap();
        let v = out.pixel(4, 4)[0];
        assert!(v < 130 && v > 100, "{v}");
    }

    #[test]
    fn test_bilateral_keeps_alpha() {
        let mut img = ImageBuffer::filled(5, 5, PixelType::Bgra8, &[10, 20, 30, 77]).unwrap();
        img.set_pixel(2, 2, &[10, 20, 30, 5]);
        let out = bilateral(&img, 5, 75.0, 75.0).unwrap();
        assert_eq!(out.pixel(2, 2)[3], 5);
        assert_eq!(out.pixel(0, 0)[3], 77);
    }

    #[test]
    fn test_bilateral_rejects_bad_params() {
        let img = ImageBuffer::filled(3, 3, PixelType::Gray8, &[0]).unwrap();
        assert!(bilateral(&img, 0, 75.0, 75.0).is_err());
        assert!(bilateral(&img, 9, 0.0, 75.0).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(sharpen(&ImageBuffer::empty()).is_err());
    }
}
