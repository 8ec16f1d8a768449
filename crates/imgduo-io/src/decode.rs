//! Shared last step of every decoder.
//!
//! Codecs hand back samples in file order (`R G B`, gray, with or without
//! alpha) as a [`RawImage`]. [`RawImage::into_buffer`] maps them onto the
//! native `B G R` layout requested by [`ColorMode`].

use crate::{ColorMode, IoError, IoResult};
use imgduo_core::{bgr_to_gray, ImageBuffer, PixelType};

/// Sample layout as produced by a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl SourceLayout {
    pub(crate) fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }
}

/// Packed 8-bit samples straight out of a codec.
#[derive(Debug)]
pub(crate) struct RawImage {
    pub width: u32,
    pub height: u32,
    pub layout: SourceLayout,
    pub data: Vec<u8>,
}

impl RawImage {
    /// Converts into a native-order buffer.
    pub(crate) fn into_buffer(self, mode: ColorMode) -> IoResult<ImageBuffer> {
        if self.width == 0 || self.height == 0 {
            return Err(IoError::InvalidFile(format!(
                "zero-sized image {}x{}",
                self.width, self.height
            )));
        }
        let src_ch = self.layout.channels();
        let expected = self.width as usize * self.height as usize * src_ch;
        if self.data.len() < expected {
            return Err(IoError::DecodeError(format!(
                "truncated pixel data: {} of {expected} bytes",
                self.data.len()
            )));
        }

        let target = match mode {
            ColorMode::Color => PixelType::Bgr8,
            ColorMode::Grayscale => PixelType::Gray8,
            ColorMode::Unchanged => match self.layout {
                SourceLayout::Gray => PixelType::Gray8,
                l if l.has_alpha() => PixelType::Bgra8,
                _ => PixelType::Bgr8,
            },
        };

        let samples = &self.data[..expected];
        let data = if target == PixelType::Gray8 && self.layout == SourceLayout::Gray {
            samples.to_vec()
        } else {
            let dst_ch = target.channels();
            let mut out = Vec::with_capacity(self.width as usize * self.height as usize * dst_ch);
            for px in samples.chunks_exact(src_ch) {
                let (r, g, b, a) = match self.layout {
                    SourceLayout::Gray => (px[0], px[0], px[0], 255),
                    SourceLayout::GrayAlpha => (px[0], px[0], px[0], px[1]),
                    SourceLayout::Rgb => (px[0], px[1], px[2], 255),
                    SourceLayout::Rgba => (px[0], px[1], px[2], px[3]),
                };
                match target {
                    PixelType::Gray8 => out.push(match self.layout {
                        SourceLayout::Gray | SourceLayout::GrayAlpha => r,
                        _ => bgr_to_gray(b, g, r),
                    }),
                    PixelType::Bgr8 => out.extend_from_slice(&[b, g, r]),
                    PixelType::Bgra8 => out.extend_from_slice(&[b, g, r, a]),
                }
            }
            out
        };

        Ok(ImageBuffer::from_raw(self.width, self.height, target, data)?)
    }
}

/// Packs a native-order buffer into file order for encoders.
///
/// Returns the packed samples and the layout they are in.
pub(crate) fn to_file_order(image: &ImageBuffer) -> IoResult<(Vec<u8>, SourceLayout)> {
    if !image.is_valid() {
        return Err(IoError::EncodeError("cannot encode an empty image".into()));
    }
    let packed = image.as_packed();
    Ok(match image.pixel_type() {
        PixelType::Gray8 => (packed.into_owned(), SourceLayout::Gray),
        PixelType::Bgr8 => (
            packed
                .chunks_exact(3)
                .flat_map(|p| [p[2], p[1], p[0]])
                .collect(),
            SourceLayout::Rgb,
        ),
        PixelType::Bgra8 => (
            packed
                .chunks_exact(4)
                .flat_map(|p| [p[2], p[1], p[0], p[3]])
                .collect(),
            SourceLayout::Rgba,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(layout: SourceLayout, data: Vec<u8>) -> RawImage {
        RawImage {
            width: 1,
            height: 1,
            layout,
            data,
        }
    }

    #[test]
    fn test_color_mode_swaps_to_bgr() {
        let img = raw(SourceLayout::Rgb, vec![10, 20, 30])
            .into_buffer(ColorMode::Color)
            .unwrap();
        assert_eq!(img.pixel_type(), PixelType::Bgr8);
        assert_eq!(img.pixel(0, 0), &[30, 20, 10]);
    }

    #[test]
    fn test_color_mode_drops_alpha_and_expands_gray() {
        let rgba = raw(SourceLayout::Rgba, vec![1, 2, 3, 4])
            .into_buffer(ColorMode::Color)
            .unwrap();
        assert_eq!(rgba.pixel(0, 0), &[3, 2, 1]);

        let gray = raw(SourceLayout::Gray, vec![77])
            .into_buffer(ColorMode::Color)
            .unwrap();
        assert_eq!(gray.pixel(0, 0), &[77, 77, 77]);
    }

    #[test]
    fn test_unchanged_mode() {
        let gray = raw(SourceLayout::Gray, vec![5]).into_buffer(ColorMode::Unchanged).unwrap();
        assert_eq!(gray.pixel_type(), PixelType::Gray8);

        let ga = raw(SourceLayout::GrayAlpha, vec![5, 9])
            .into_buffer(ColorMode::Unchanged)
            .unwrap();
        assert_eq!(ga.pixel(0, 0), &[5, 5, 5, 9]);
    }

    #[test]
    fn test_grayscale_mode() {
        let img = raw(SourceLayout::Rgb, vec![255, 0, 0])
            .into_buffer(ColorMode::Grayscale)
            .unwrap();
        assert_eq!(img.pixel(0, 0), &[76]);
    }

    #[test]
    fn test_truncated_data() {
        let err = RawImage {
            width: 2,
            height: 2,
            layout: SourceLayout::Rgb,
            data: vec![0; 5],
        }
        .into_buffer(ColorMode::Color)
        .unwrap_err();
        assert!(matches!(err, IoError::DecodeError(_)));
    }

    #[test]
    fn test_to_file_order() {
        let img = ImageBuffer::filled(2, 1, PixelType::Bgra8, &[1, 2, 3, 4]).unwrap();
        let (data, layout) = to_file_order(&img).unwrap();
        assert_eq!(layout, SourceLayout::Rgba);
        assert_eq!(data, vec![3, 2, 1, 4, 3, 2, 1, 4]);
        assert!(to_file_order(&ImageBuffer::empty()).is_err());
    }
}
