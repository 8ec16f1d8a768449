//! Pixel layouts and per-pixel helpers.
//!
//! Every buffer in imgduo stores 8-bit unsigned samples. What varies is the
//! number and order of channels, described by [`PixelType`].
//!
//! | Type | Channels | Order |
//! |------|----------|-------|
//! | [`PixelType::Gray8`] | 1 | `Y` |
//! | [`PixelType::Bgr8`] | 3 | `B G R` |
//! | [`PixelType::Bgra8`] | 4 | `B G R A` |

use crate::{Error, Result};
use std::fmt;

/// Fixed-point luminance weights (BT.601) scaled by `1 << GRAY_SHIFT`.
///
/// Order matches the native `B G R` layout.
pub const GRAY_WEIGHTS_BGR: [u32; 3] = [1868, 9617, 4899];

/// Bit shift used by [`GRAY_WEIGHTS_BGR`].
pub const GRAY_SHIFT: u32 = 14;

/// Channel layout of an 8-bit buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelType {
    /// Single channel luminance.
    Gray8,
    /// Three channels, blue first.
    #[default]
    Bgr8,
    /// Four channels, blue first, alpha last.
    Bgra8,
}

impl PixelType {
    /// Returns the layout for a channel count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any count other than 1, 3 or 4.
    ///
    /// ```rust
    /// use imgduo_core::PixelType;
    ///
    /// assert_eq!(PixelType::from_channels(3).unwrap(), PixelType::Bgr8);
    /// assert!(PixelType::from_channels(2).is_err());
    /// ```
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(Self::Gray8),
            3 => Ok(Self::Bgr8),
            4 => Ok(Self::Bgra8),
            n => Err(Error::unsupported_format(format!("{n}-channel 8-bit"))),
        }
    }

    /// Number of interleaved channels.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Bgr8 => 3,
            Self::Bgra8 => 4,
        }
    }

    /// Bytes per pixel (one byte per channel).
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.channels()
    }

    /// Returns `true` if the layout carries an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Bgra8)
    }

    /// Short conventional name (`8UC1`, `8UC3`, `8UC4`).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gray8 => "8UC1",
            Self::Bgr8 => "8UC3",
            Self::Bgra8 => "8UC4",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Luminance of one `B G R` pixel using rounded 14-bit fixed point.
///
/// ```rust
/// use imgduo_core::bgr_to_gray;
///
/// assert_eq!(bgr_to_gray(0, 0, 0), 0);
/// assert_eq!(bgr_to_gray(255, 255, 255), 255);
/// assert_eq!(bgr_to_gray(0, 0, 255), 76); // red
/// ```
#[inline]
pub fn bgr_to_gray(b: u8, g: u8, r: u8) -> u8 {
    let [wb, wg, wr] = GRAY_WEIGHTS_BGR;
    let acc = b as u32 * wb + g as u32 * wg + r as u32 * wr;
    ((acc + (1 << (GRAY_SHIFT - 1))) >> GRAY_SHIFT) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let sum: u32 = GRAY_WEIGHTS_BGR.iter().sum();
        assert_eq!(sum, 1 << GRAY_SHIFT);
    }

    #[test]
    fn test_gray_of_neutral_is_identity() {
        for v in [0u8, 1, 17, 128, 200, 254, 255] {
            assert_eq!(bgr_to_gray(v, v, v), v);
        }
    }

    #[test]
    fn test_gray_primaries() {
        assert_eq!(bgr_to_gray(255, 0, 0), 29);
        assert_eq!(bgr_to_gray(0, 255, 0), 150);
        assert_eq!(bgr_to_gray(0, 0, 255), 76);
    }

    #[test]
    fn test_from_channels_roundtrip() {
        for pt in [PixelType::Gray8, PixelType::Bgr8, PixelType::Bgra8] {
            assert_eq!(PixelType::from_channels(pt.channels() as u8).unwrap(), pt);
        }
        assert!(PixelType::from_channels(0).is_err());
        assert!(PixelType::from_channels(5).is_err());
    }
}
