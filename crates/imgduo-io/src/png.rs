//! PNG format support.
//!
//! Decoding normalizes every PNG variant to 8-bit samples: palettes and
//! sub-byte grays are expanded, 16-bit samples are stripped to their high
//! byte. Encoding writes 8-bit gray, RGB or RGBA.
//!
//! # Example
//!
//! ```rust,ignore
//! use imgduo_io::{png, ReadOptions};
//!
//! let image = png::read("input.png", &ReadOptions::default())?;
//! png::write("output.png", &image)?;
//! ```

use crate::decode::{to_file_order, RawImage, SourceLayout};
use crate::{IoError, IoResult, ReadOptions};
use imgduo_core::ImageBuffer;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Seek, Write};
use std::path::Path;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P, options: &ReadOptions) -> IoResult<ImageBuffer> {
    let file = File::open(path.as_ref())?;
    decode_raw(BufReader::new(file))?.into_buffer(options.mode)
}

/// Reads a PNG image from memory.
pub fn read_from_memory(data: &[u8], options: &ReadOptions) -> IoResult<ImageBuffer> {
    decode_raw(Cursor::new(data))?.into_buffer(options.mode)
}

fn decode_raw<R: BufRead + Seek>(reader: R) -> IoResult<RawImage> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    if info.bit_depth != png::BitDepth::Eight {
        return Err(IoError::UnsupportedBitDepth(format!(
            "{:?} {:?}",
            info.color_type, info.bit_depth
        )));
    }
    let layout = match info.color_type {
        png::ColorType::Grayscale => SourceLayout::Gray,
        png::ColorType::GrayscaleAlpha => SourceLayout::GrayAlpha,
        png::ColorType::Rgb => SourceLayout::Rgb,
        png::ColorType::Rgba => SourceLayout::Rgba,
        png::ColorType::Indexed => {
            return Err(IoError::UnsupportedBitDepth("unexpanded palette".into()));
        }
    };

    // Rows come back packed at this depth
    buf.truncate(info.buffer_size());
    Ok(RawImage {
        width: info.width,
        height: info.height,
        layout,
        data: buf,
    })
}

/// Writes an image to a PNG file.
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    encode(BufWriter::new(file), image)
}

/// Encodes an image to PNG bytes in memory.
pub fn write_to_memory(image: &ImageBuffer) -> IoResult<Vec<u8>> {
    let mut out = Vec::new();
    encode(&mut out, image)?;
    Ok(out)
}

fn encode<W: Write>(writer: W, image: &ImageBuffer) -> IoResult<()> {
    let (data, layout) = to_file_order(image)?;
    let color_type = match layout {
        SourceLayout::Gray => png::ColorType::Grayscale,
        SourceLayout::GrayAlpha => png::ColorType::GrayscaleAlpha,
        SourceLayout::Rgb => png::ColorType::Rgb,
        SourceLayout::Rgba => png::ColorType::Rgba,
    };

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::default());

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}
