//! # imgduo-io
//!
//! Image decode and encode for imgduo.
//!
//! Every decoder produces an [`ImageBuffer`] in native channel order
//! (`B G R` / `B G R A`), so the rest of the workspace never sees file
//! order. Paths are passed through as [`Path`] end to end; names with
//! non-ASCII characters work on every platform.
//!
//! - [`read`] / [`read_with`] - Decode a file, auto-detecting the format
//! - [`read_from_memory`] - Decode an in-memory file
//! - [`write`] / [`write_with`] - Encode, format chosen by extension
//! - [`ImageReader`] - Load seam used by the engine; [`FileReader`] is the default
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use imgduo_io::{read, write};
//!
//! let image = read("input.jpg")?;   // always 3-channel BGR
//! write("output.png", &image)?;
//! ```
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Notes |
//! |--------|------|-------|-------|
//! | PNG | Yes | Yes | 16-bit stripped to 8, palettes expanded |
//! | JPEG | Yes | Yes | RGB, gray, CMYK input |
//! | BMP | Yes | Yes | via `image` |
//!
//! # Read Modes
//!
//! [`ColorMode::Color`] (the default) always yields `Bgr8`: gray is
//! replicated and alpha dropped. [`ColorMode::Grayscale`] yields `Gray8`.
//! [`ColorMode::Unchanged`] keeps the file's own channel count.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod decode;
mod detect;
mod error;
mod options;
mod traits;

pub mod bmp;
pub mod jpeg;
pub mod png;

pub use detect::Format;
pub use error::{IoError, IoResult};
pub use options::{ColorMode, ReadOptions, WriteOptions};
pub use traits::{FileReader, FileWriter, ImageReader, ImageWriter};

use imgduo_core::ImageBuffer;
use std::path::Path;
use tracing::debug;

/// Reads an image from a file with default options, auto-detecting the format.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be opened
/// - The format is not supported
/// - The file is corrupted
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<ImageBuffer> {
    read_with(path, &ReadOptions::default())
}

/// Reads an image from a file with explicit options.
pub fn read_with<P: AsRef<Path>>(path: P, options: &ReadOptions) -> IoResult<ImageBuffer> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), ?format, mode = ?options.mode, "decode");

    match format {
        Format::Png => png::read(path, options),
        Format::Jpeg => jpeg::read(path, options),
        Format::Bmp => bmp::read(path, options),
        Format::Unknown => Err(unsupported(path)),
    }
}

/// Decodes an in-memory file, detecting the format from its magic bytes.
pub fn read_from_memory(data: &[u8], options: &ReadOptions) -> IoResult<ImageBuffer> {
    match Format::from_bytes(data) {
        Format::Png => png::read_from_memory(data, options),
        Format::Jpeg => jpeg::read_from_memory(data, options),
        Format::Bmp => bmp::read_from_memory(data, options),
        Format::Unknown => Err(IoError::UnsupportedFormat("unrecognized signature".into())),
    }
}

/// Writes an image to a file with default options, detecting format from extension.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be created
/// - The extension names no supported format
/// - The image is empty
pub fn write<P: AsRef<Path>>(path: P, image: &ImageBuffer) -> IoResult<()> {
    write_with(path, image, &WriteOptions::default())
}

/// Writes an image to a file with explicit options.
pub fn write_with<P: AsRef<Path>>(path: P, image: &ImageBuffer, options: &WriteOptions) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), ?format, "encode");

    match format {
        Format::Png => png::write(path, image),
        Format::Jpeg => jpeg::write(path, image, options),
        Format::Bmp => bmp::write(path, image),
        Format::Unknown => Err(unsupported(path)),
    }
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string()),
    )
}
