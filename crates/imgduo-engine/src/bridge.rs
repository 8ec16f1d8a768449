//! Conversion of native buffers into displayable bitmaps.

use imgduo_core::{ImageBuffer, PixelType};
use tracing::trace;

/// Memory layout of a [`DisplayBitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    /// One byte per pixel.
    Gray8,
    /// Three bytes per pixel, red first.
    Rgb8,
    /// Four bytes per pixel in native order (B, G, R, A), which is 32-bit
    /// ARGB on little-endian targets.
    Bgra8,
}

impl DisplayFormat {
    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Bgra8 => 4,
        }
    }
}

/// A bitmap ready for presentation. Owns its pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per row.
    pub stride: usize,
    /// Pixel layout.
    pub format: DisplayFormat,
    /// `height * stride` bytes.
    pub data: Vec<u8>,
}

impl DisplayBitmap {
    /// Row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }

    /// Size of this bitmap scaled to fit `surface`.
    pub fn fitted(&self, surface: (u32, u32)) -> (u32, u32) {
        fit_within((self.width, self.height), surface)
    }
}

/// Converts a buffer for display.
///
/// Empty buffers give `None`; the caller shows the slot placeholder.
/// Gray and BGRA buffers keep their stride; BGR buffers are reordered to
/// RGB with tight rows. The result never shares memory with `image`.
pub fn to_displayable(image: &ImageBuffer) -> Option<DisplayBitmap> {
    if !image.is_valid() {
        return None;
    }
    let (width, height) = image.dimensions();
    let strided = || image.data()[..image.stride() * height as usize].to_vec();
    trace!(width, height, pixel_type = %image.pixel_type(), "to_displayable");
    let bitmap = match image.pixel_type() {
        PixelType::Gray8 => DisplayBitmap {
            width,
            height,
            stride: image.stride(),
            format: DisplayFormat::Gray8,
            data: strided(),
        },
        PixelType::Bgra8 => DisplayBitmap {
            width,
            height,
            stride: image.stride(),
            format: DisplayFormat::Bgra8,
            data: strided(),
        },
        PixelType::Bgr8 => {
            let mut data = Vec::with_capacity(image.row_bytes() * height as usize);
            for row in image.rows() {
                for px in row.chunks_exact(3) {
                    data.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
            DisplayBitmap {
                width,
                height,
                stride: image.row_bytes(),
                format: DisplayFormat::Rgb8,
                data,
            }
        }
    };
    Some(bitmap)
}

/// Largest size with the aspect ratio of `size` that fits in `surface`.
///
/// Both dimensions stay at least 1 unless an input is zero-sized, in which
/// case the result is `(0, 0)`.
pub fn fit_within(size: (u32, u32), surface: (u32, u32)) -> (u32, u32) {
    let (w, h) = (u64::from(size.0), u64::from(size.1));
    let (sw, sh) = (u64::from(surface.0), u64::from(surface.1));
    if w == 0 || h == 0 || sw == 0 || sh == 0 {
        return (0, 0);
    }
    let scaled_w = sh * w / h;
    let (fw, fh) = if scaled_w <= sw {
        (scaled_w, sh)
    } else {
        (sw, sw * h / w)
    };
    (fw.max(1) as u32, fh.max(1) as u32)
}
