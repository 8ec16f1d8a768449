//! Format detection utilities.
//!
//! Detects image formats from file extensions and magic bytes.

use crate::IoResult;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// Unknown/unsupported format.
    Unknown,
}

impl Format {
    /// Detects format from file path (extension + magic bytes).
    ///
    /// First checks magic bytes, falls back to extension.
    pub fn detect<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();

        if let Ok(format) = Self::from_magic_bytes(path) {
            if format != Format::Unknown {
                return Ok(format);
            }
        }

        Ok(Self::from_extension(path))
    }

    /// Detects format from file extension only.
    ///
    /// The extension is compared case-insensitively; non-UTF-8 extensions
    /// are treated as unknown.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("png") => Format::Png,
            Some("jpg") | Some("jpeg") | Some("jpe") => Format::Jpeg,
            Some("bmp") | Some("dib") => Format::Bmp,
            _ => Format::Unknown,
        }
    }

    /// Detects format from file magic bytes.
    pub fn from_magic_bytes<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 8];

        let bytes_read = file.read(&mut header)?;
        Ok(Self::from_bytes(&header[..bytes_read]))
    }

    /// Detects format from raw bytes (magic number check).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        // PNG: 0x89 'P' 'N' 'G' CR LF SUB LF
        if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
            return Format::Png;
        }

        // JPEG: SOI followed by a marker
        if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
            return Format::Jpeg;
        }

        // BMP: "BM"
        if bytes.len() >= 2 && bytes[0..2] == [b'B', b'M'] {
            return Format::Bmp;
        }

        Format::Unknown
    }

    /// Returns the typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Bmp => "bmp",
            Format::Unknown => "",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::Bmp => "image/bmp",
            Format::Unknown => "application/octet-stream",
        }
    }

    /// Returns true if this format can store an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        matches!(self, Format::Png | Format::Bmp)
    }

    /// Returns true if encoding loses information.
    pub fn is_lossy(&self) -> bool {
        matches!(self, Format::Jpeg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(Format::from_extension("test.png"), Format::Png);
        assert_eq!(Format::from_extension("test.PNG"), Format::Png);
        assert_eq!(Format::from_extension("test.jpg"), Format::Jpeg);
        assert_eq!(Format::from_extension("test.jpeg"), Format::Jpeg);
        assert_eq!(Format::from_extension("test.bmp"), Format::Bmp);
        assert_eq!(Format::from_extension("test.tiff"), Format::Unknown);
        assert_eq!(Format::from_extension("noext"), Format::Unknown);
    }

    #[test]
    fn test_magic_bytes() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(Format::from_bytes(&png), Format::Png);

        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(Format::from_bytes(&jpeg), Format::Jpeg);

        let bmp = [b'B', b'M', 0x36, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert_eq!(Format::from_bytes(&bmp), Format::Bmp);

        assert_eq!(Format::from_bytes(&[0x00, 0x00, 0x00, 0x00]), Format::Unknown);
        assert_eq!(Format::from_bytes(&[]), Format::Unknown);
    }

    #[test]
    fn test_format_properties() {
        assert_eq!(Format::Bmp.extension(), "bmp");
        assert_eq!(Format::Png.mime_type(), "image/png");
        assert!(Format::Jpeg.is_lossy());
        assert!(!Format::Jpeg.supports_alpha());
    }
}
