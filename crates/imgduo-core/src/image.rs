//! Owned image buffer.
//!
//! [`ImageBuffer`] is the only pixel container in imgduo. It is a plain
//! owned `Vec<u8>` with an explicit row stride, so `clone()` is always a deep
//! copy: two slots holding "the same" image never share storage.
//!
//! # Memory Layout
//!
//! Rows are stored top-to-bottom, each `stride` bytes apart. Only the first
//! `width * channels` bytes of each row are pixel data; the rest is padding.
//!
//! ```text
//! Memory: [B G R B G R B G R .. pad]  <- Row 0
//!         [B G R B G R B G R .. pad]  <- Row 1
//! ```
//!
//! # Empty vs Valid
//!
//! A buffer is either *empty* (0x0, no storage) or *valid* (positive
//! dimensions, storage of at least `height * stride` bytes). Constructors
//! reject anything in between.

use crate::{Error, PixelType, Result};
use std::borrow::Cow;
use std::fmt;

/// Owned 8-bit image with 1, 3 or 4 interleaved channels.
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
///
/// let mut img = ImageBuffer::new(3, 2, PixelType::Gray8).unwrap();
/// img.set_pixel(1, 1, &[42]);
/// assert_eq!(img.pixel(1, 1), &[42]);
///
/// let copy = img.clone();
/// img.set_pixel(1, 1, &[7]);
/// assert_eq!(copy.pixel(1, 1), &[42]); // deep copy, no aliasing
/// ```
#[derive(Clone, Default)]
pub struct ImageBuffer {
    /// Backing storage, at least `height * stride` bytes when valid
    data: Vec<u8>,
    /// Image width in pixels
    width: u32,
    /// Image height in pixels
    height: u32,
    /// Bytes between the starts of consecutive rows
    stride: usize,
    /// Channel layout (meaningless while empty)
    pixel_type: PixelType,
}

impl ImageBuffer {
    /// Returns an empty buffer (0x0, no storage).
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a zero-filled, tightly packed buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32, pixel_type: PixelType) -> Result<Self> {
        let row_bytes = checked_row_bytes(width, height, pixel_type)?;
        Ok(Self {
            data: vec![0u8; row_bytes * height as usize],
            width,
            height,
            stride: row_bytes,
            pixel_type,
        })
    }

    /// Creates a buffer with every pixel set to `pixel`.
    ///
    /// # Errors
    ///
    /// Fails if `pixel.len()` is not the channel count of `pixel_type`, or
    /// the dimensions are invalid.
    pub fn filled(width: u32, height: u32, pixel_type: PixelType, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != pixel_type.channels() {
            return Err(Error::unsupported_format(format!(
                "{} samples for {}",
                pixel.len(),
                pixel_type
            )));
        }
        let row_bytes = checked_row_bytes(width, height, pixel_type)?;
        let data = pixel
            .iter()
            .copied()
            .cycle()
            .take(row_bytes * height as usize)
            .collect();
        Ok(Self {
            data,
            width,
            height,
            stride: row_bytes,
            pixel_type,
        })
    }

    /// Wraps tightly packed pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` is shorter than
    /// `width * height * channels`.
    pub fn from_raw(width: u32, height: u32, pixel_type: PixelType, data: Vec<u8>) -> Result<Self> {
        let row_bytes = checked_row_bytes(width, height, pixel_type)?;
        Self::from_raw_with_stride(width, height, pixel_type, row_bytes, data)
    }

    /// Wraps pixel data whose rows are `stride` bytes apart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStride`] if a row does not fit in `stride`, or
    /// [`Error::BufferTooSmall`] if `data.len() < height * stride`.
    pub fn from_raw_with_stride(
        width: u32,
        height: u32,
        pixel_type: PixelType,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = checked_row_bytes(width, height, pixel_type)?;
        if stride < row_bytes {
            return Err(Error::InvalidStride {
                stride,
                min_stride: row_bytes,
                width,
            });
        }
        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflow"))?;
        if data.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            pixel_type,
        })
    }

    /// Wraps packed data given a raw channel count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for channel counts outside {1, 3, 4}.
    pub fn from_channels(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        let pixel_type = PixelType::from_channels(channels)?;
        Self::from_raw(width, height, pixel_type, data)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Channel layout.
    #[inline]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Number of channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.pixel_type.channels()
    }

    /// Bytes between row starts.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of pixel data per row (`width * channels`).
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Returns `true` for the 0x0 buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if the buffer holds an image.
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.is_empty() && self.data.len() >= self.stride * self.height as usize
    }

    /// Returns `true` if `other` has the same dimensions and pixel type.
    #[inline]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.pixel_type == other.pixel_type
    }

    /// Returns `true` if rows are stored without padding.
    #[inline]
    pub fn is_packed(&self) -> bool {
        self.stride == self.row_bytes()
    }

    /// Raw backing storage, including row padding.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the pixel bytes of row `y` (padding excluded).
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    /// Mutable pixel bytes of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of bounds");
        let start = y as usize * self.stride;
        let len = self.row_bytes();
        &mut self.data[start..start + len]
    }

    /// Iterates over rows top-to-bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Returns the samples of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(x < self.width, "column {x} out of bounds");
        let c = self.channels();
        let start = x as usize * c;
        &self.row(y)[start..start + c]
    }

    /// Returns the samples of pixel `(x, y)`, or an error if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<&[u8]> {
        if x < self.width && y < self.height {
            Ok(self.pixel(x, y))
        } else {
            Err(Error::out_of_bounds(x, y, self.width, self.height))
        }
    }

    /// Overwrites pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if out of bounds or `samples.len() != channels`.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, samples: &[u8]) {
        assert!(x < self.width, "column {x} out of bounds");
        let c = self.channels();
        let start = x as usize * c;
        self.row_mut(y)[start..start + c].copy_from_slice(samples);
    }

    /// Returns pixel data without padding, borrowing when already packed.
    pub fn as_packed(&self) -> Cow<'_, [u8]> {
        if self.is_packed() {
            Cow::Borrowed(&self.data[..self.row_bytes() * self.height as usize])
        } else {
            let mut out = Vec::with_capacity(self.row_bytes() * self.height as usize);
            for row in self.rows() {
                out.extend_from_slice(row);
            }
            Cow::Owned(out)
        }
    }

    /// Consumes the buffer and returns packed pixel data.
    pub fn into_packed(self) -> Vec<u8> {
        if self.is_packed() {
            let mut data = self.data;
            data.truncate(self.stride * self.height as usize);
            data
        } else {
            self.as_packed().into_owned()
        }
    }

    /// Returns a packed deep copy (drops any row padding).
    pub fn to_packed(&self) -> Self {
        Self {
            data: self.as_packed().into_owned(),
            width: self.width,
            height: self.height,
            stride: self.row_bytes(),
            pixel_type: self.pixel_type,
        }
    }
}

/// Two buffers are equal when they have the same shape and pixel bytes.
///
/// Row padding is ignored, so a strided buffer equals its packed copy.
impl PartialEq for ImageBuffer {
    fn eq(&self, other: &Self) -> bool {
        if self.is_empty() && other.is_empty() {
            return true;
        }
        self.same_shape(other) && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

impl Eq for ImageBuffer {}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ImageBuffer(empty)");
        }
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_type", &self.pixel_type)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

/// Validates dimensions and returns the packed row size in bytes.
fn checked_row_bytes(width: u32, height: u32, pixel_type: PixelType) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_dimensions(width, height, "zero-sized image"));
    }
    let row = (width as usize)
        .checked_mul(pixel_type.channels())
        .ok_or_else(|| Error::invalid_dimensions(width, height, "row size overflow"))?;
    row.checked_mul(height as usize)
        .ok_or_else(|| Error::invalid_dimensions(width, height, "size overflow"))?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let img = ImageBuffer::empty();
        assert!(img.is_empty());
        assert!(!img.is_valid());
        assert!(img.data().is_empty());
    }

    #[test]
    fn test_new_rejects_zero() {
        assert!(ImageBuffer::new(0, 10, PixelType::Gray8).is_err());
        assert!(ImageBuffer::new(10, 0, PixelType::Bgr8).is_err());
    }

    #[test]
    fn test_filled() {
        let img = ImageBuffer::filled(3, 2, PixelType::Bgr8, &[1, 2, 3]).unwrap();
        assert_eq!(img.row_bytes(), 9);
        for (x, y) in [(0, 0), (2, 1)] {
            assert_eq!(img.pixel(x, y), &[1, 2, 3]);
        }
        assert!(ImageBuffer::filled(3, 2, PixelType::Bgr8, &[1, 2]).is_err());
    }

    #[test]
    fn test_stride_validation() {
        let short = ImageBuffer::from_raw_with_stride(4, 2, PixelType::Bgr8, 8, vec![0; 32]);
        assert!(matches!(short, Err(Error::InvalidStride { .. })));

        let tiny = ImageBuffer::from_raw_with_stride(4, 2, PixelType::Bgr8, 16, vec![0; 20]);
        assert!(matches!(tiny, Err(Error::BufferTooSmall { .. })));
    }

    #[test]
    fn test_padded_rows() {
        // 2x2 gray, stride 4: two bytes of padding per row
        let data = vec![1, 2, 99, 99, 3, 4, 99, 99];
        let img = ImageBuffer::from_raw_with_stride(2, 2, PixelType::Gray8, 4, data).unwrap();
        assert!(!img.is_packed());
        assert_eq!(img.row(1), &[3, 4]);
        assert_eq!(&*img.as_packed(), &[1, 2, 3, 4]);

        let packed = img.to_packed();
        assert!(packed.is_packed());
        assert_eq!(packed, img);
    }

    #[test]
    fn test_from_channels_unsupported() {
        let err = ImageBuffer::from_channels(2, 2, 2, vec![0; 8]).unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_clone_is_deep() {
        let mut a = ImageBuffer::filled(2, 2, PixelType::Gray8, &[10]).unwrap();
        let b = a.clone();
        a.set_pixel(0, 0, &[200]);
        assert_eq!(b.pixel(0, 0), &[10]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_pixel_bounds() {
        let img = ImageBuffer::new(2, 2, PixelType::Gray8).unwrap();
        assert!(img.get_pixel(1, 1).is_ok());
        assert!(matches!(img.get_pixel(2, 0), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn test_into_packed_truncates_slack() {
        let img = ImageBuffer::from_raw(2, 1, PixelType::Gray8, vec![5, 6, 7, 8]).unwrap();
        assert_eq!(img.into_packed(), vec![5, 6]);
    }
}
