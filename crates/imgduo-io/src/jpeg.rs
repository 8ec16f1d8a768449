//! JPEG format support.
//!
//! Decoding accepts RGB, grayscale, CMYK and 16-bit grayscale streams.
//! Encoding writes baseline JPEG straight from the native `B G R` layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgduo_io::{jpeg, ReadOptions, WriteOptions};
//!
//! let image = jpeg::read("photo.jpg", &ReadOptions::default())?;
//! jpeg::write("out.jpg", &image, &WriteOptions::default())?;
//! ```

use crate::decode::{RawImage, SourceLayout};
use crate::{IoError, IoResult, ReadOptions, WriteOptions};
use imgduo_core::{ImageBuffer, PixelType};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Reads a JPEG file from the given path.
pub fn read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> IoResult<ImageBuffer> {
    let file = std::fs::File::open(path.as_ref())?;
    decode_raw(BufReader::new(file))?.into_buffer(options.mode)
}

/// Reads a JPEG image from memory.
pub fn read_from_memory(data: &[u8], options: &ReadOptions) -> IoResult<ImageBuffer> {
    decode_raw(Cursor::new(data))?.into_buffer(options.mode)
}

fn decode_raw<R: Read>(reader: R) -> IoResult<RawImage> {
    let mut decoder = jpeg_decoder::Decoder::new(reader);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let (layout, data) = match info.pixel_format {
        jpeg_decoder::PixelFormat::RGB24 => (SourceLayout::Rgb, pixels),
        jpeg_decoder::PixelFormat::L8 => (SourceLayout::Gray, pixels),
        jpeg_decoder::PixelFormat::L16 => {
            // Keep the high byte
            (SourceLayout::Gray, pixels.chunks_exact(2).map(|l| l[0]).collect())
        }
        jpeg_decoder::PixelFormat::CMYK32 => {
            let rgb = pixels
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 1.0 - cmyk[3] as f32 / 255.0;
                    let channel = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
                    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
                })
                .collect();
            (SourceLayout::Rgb, rgb)
        }
    };

    Ok(RawImage {
        width: info.width as u32,
        height: info.height as u32,
        layout,
        data,
    })
}

/// Writes an image to a JPEG file.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer, options: &WriteOptions) -> IoResult<()> {
    let data = write_to_memory(image, options)?;
    std::fs::write(path.as_ref(), data)?;
    Ok(())
}

/// Encodes an image to JPEG bytes in memory.
///
/// Alpha is discarded; JPEG has no alpha channel.
pub fn write_to_memory(image: &ImageBuffer, options: &WriteOptions) -> IoResult<Vec<u8>> {
    use jpeg_encoder::{ColorType, Encoder};

    if !image.is_valid() {
        return Err(IoError::EncodeError("cannot encode an empty image".into()));
    }
    let (width, height) = image.dimensions();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(IoError::EncodeError(format!(
            "{width}x{height} exceeds JPEG limit of {}",
            u16::MAX
        )));
    }

    let color_type = match image.pixel_type() {
        PixelType::Gray8 => ColorType::Luma,
        PixelType::Bgr8 => ColorType::Bgr,
        PixelType::Bgra8 => ColorType::Bgra,
    };
    let pixels = image.as_packed();

    let mut buffer = Vec::new();
    let encoder = Encoder::new(&mut buffer, options.jpeg_quality);
    encoder
        .encode(&pixels, width as u16, height as u16, color_type)
        .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorMode;

    #[test]
    fn test_roundtrip_flat_color() {
        // Flat fields survive lossy coding almost exactly
        let image = ImageBuffer::filled(16, 16, PixelType::Bgr8, &[200, 100, 50]).unwrap();
        let bytes = write_to_memory(&image, &WriteOptions::default()).unwrap();
        let loaded = read_from_memory(&bytes, &ReadOptions::default()).unwrap();

        assert_eq!(loaded.dimensions(), (16, 16));
        assert_eq!(loaded.pixel_type(), PixelType::Bgr8);
        let px = loaded.pixel(8, 8);
        for (got, want) in px.iter().zip([200u8, 100, 50]) {
            assert!((*got as i32 - want as i32).abs() <= 4, "{px:?}");
        }
    }

    #[test]
    fn test_gray_stream() {
        let image = ImageBuffer::filled(8, 8, PixelType::Gray8, &[128]).unwrap();
        let bytes = write_to_memory(&image, &WriteOptions::default()).unwrap();

        let unchanged =
            read_from_memory(&bytes, &ReadOptions::new().with_mode(ColorMode::Unchanged)).unwrap();
        assert_eq!(unchanged.pixel_type(), PixelType::Gray8);

        let color = read_from_memory(&bytes, &ReadOptions::default()).unwrap();
        assert_eq!(color.pixel_type(), PixelType::Bgr8);
    }

    #[test]
    fn test_empty_image_rejected() {
        assert!(write_to_memory(&ImageBuffer::empty(), &WriteOptions::default()).is_err());
    }
}
