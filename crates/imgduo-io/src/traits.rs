//! I/O traits for image readers and writers.
//!
//! [`ImageReader`] is the load seam: anything that turns a path into a
//! decoded buffer (or a decode failure). [`FileReader`] is the default
//! implementation backed by this crate's codecs; tests substitute their own.
//! [`FileWriter`] is the matching save path used by the command line.

use crate::{IoResult, ReadOptions};
use imgduo_core::ImageBuffer;
use std::path::Path;

/// Trait for image loaders.
///
/// Object safe so callers can hold a `Box<dyn ImageReader>`.
///
/// # Example
///
/// ```rust
/// use imgduo_core::{ImageBuffer, PixelType};
/// use imgduo_io::{ImageReader, IoResult};
/// use std::path::Path;
///
/// struct Solid;
///
/// impl ImageReader for Solid {
///     fn read(&self, _path: &Path) -> IoResult<ImageBuffer> {
///         Ok(ImageBuffer::filled(2, 2, PixelType::Gray8, &[0])?)
///     }
/// }
///
/// assert!(Solid.read(Path::new("whatever")).is_ok());
/// ```
pub trait ImageReader {
    /// Reads an image from a file path.
    fn read(&self, path: &Path) -> IoResult<ImageBuffer>;
}

/// Trait for image writers.
pub trait ImageWriter {
    /// Writes an image to a file path.
    fn write(&self, path: &Path, image: &ImageBuffer) -> IoResult<()>;
}

/// Reads files from disk with format auto-detection.
#[derive(Debug, Clone, Default)]
pub struct FileReader {
    options: ReadOptions,
}

impl FileReader {
    /// Creates a reader with default options (3-channel color).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with the given options.
    pub fn with_options(options: ReadOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }
}

impl ImageReader for FileReader {
    fn read(&self, path: &Path) -> IoResult<ImageBuffer> {
        crate::read_with(path, &self.options)
    }
}

/// Writes files to disk, picking the codec from the extension.
#[derive(Debug, Clone, Default)]
pub struct FileWriter {
    options: crate::WriteOptions,
}

impl FileWriter {
    /// Creates a writer with the given options.
    pub fn with_options(options: crate::WriteOptions) -> Self {
        Self { options }
    }
}

impl ImageWriter for FileWriter {
    fn write(&self, path: &Path, image: &ImageBuffer) -> IoResult<()> {
        crate::write_with(path, image, &self.options)
    }
}
