//! BMP format support via the `image` crate.

use crate::decode::{to_file_order, RawImage, SourceLayout};
use crate::{IoError, IoResult, ReadOptions};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use imgduo_core::ImageBuffer;
use std::path::Path;

/// Reads a BMP file from the given path.
pub fn read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> IoResult<ImageBuffer> {
    let bytes = std::fs::read(path.as_ref())?;
    read_from_memory(&bytes, options)
}

/// Reads a BMP image from memory.
pub fn read_from_memory(data: &[u8], options: &ReadOptions) -> IoResult<ImageBuffer> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Bmp)
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    dynamic_to_raw(img).into_buffer(options.mode)
}

fn dynamic_to_raw(img: DynamicImage) -> RawImage {
    let (width, height) = (img.width(), img.height());
    let (layout, data) = match img {
        DynamicImage::ImageLuma8(gray) => (SourceLayout::Gray, gray.into_raw()),
        DynamicImage::ImageLumaA8(gray_alpha) => (SourceLayout::GrayAlpha, gray_alpha.into_raw()),
        DynamicImage::ImageRgb8(rgb) => (SourceLayout::Rgb, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (SourceLayout::Rgba, rgba.into_raw()),
        other => (SourceLayout::Rgba, other.to_rgba8().into_raw()),
    };
    RawImage {
        width,
        height,
        layout,
        data,
    }
}

/// Writes an image to a BMP file.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> IoResult<()> {
    let data = write_to_memory(image)?;
    std::fs::write(path.as_ref(), data)?;
    Ok(())
}

/// Encodes an image to BMP bytes in memory.
pub fn write_to_memory(image: &ImageBuffer) -> IoResult<Vec<u8>> {
    let (data, layout) = to_file_order(image)?;
    let color_type = match layout {
        SourceLayout::Gray => ExtendedColorType::L8,
        SourceLayout::GrayAlpha => ExtendedColorType::La8,
        SourceLayout::Rgb => ExtendedColorType::Rgb8,
        SourceLayout::Rgba => ExtendedColorType::Rgba8,
    };

    let mut out = Vec::new();
    image::codecs::bmp::BmpEncoder::new(&mut out)
        .write_image(&data, image.width(), image.height(), color_type)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    #[test]
    fn test_roundtrip_bgr() {
        let mut image = ImageBuffer::new(7, 5, PixelType::Bgr8).unwrap();
        image.set_pixel(3, 2, &[1, 2, 3]);
        let bytes = write_to_memory(&image).unwrap();
        let loaded = read_from_memory(&bytes, &ReadOptions::default()).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_not_a_bitmap() {
        assert!(read_from_memory(b"BMnope", &ReadOptions::default()).is_err());
    }
}
