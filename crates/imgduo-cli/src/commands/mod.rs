//! CLI command implementations

pub mod info;
pub mod ops;
pub mod run;

use anyhow::{Context, Result};
use imgduo_core::ImageBuffer;
use imgduo_engine::{Session, Slot};
use imgduo_io::{ColorMode, FileReader, FileWriter, ImageWriter, ReadOptions, WriteOptions};
use std::path::Path;

/// Creates a session whose loader decodes with `mode`.
pub fn session(mode: ColorMode) -> Session {
    Session::with_reader(FileReader::with_options(ReadOptions::new().with_mode(mode)))
}

/// Loads `path` into `slot`.
pub fn load(session: &mut Session, slot: Slot, path: &Path) -> Result<()> {
    session
        .load_path(slot, path)
        .with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &ImageBuffer, quality: u8) -> Result<()> {
    let writer = FileWriter::with_options(WriteOptions::default().with_jpeg_quality(quality));
    writer
        .write(path, image)
        .with_context(|| format!("Failed to save: {}", path.display()))
}

/// Format file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_save_image_picks_codec_from_extension() {
        let dir = TempDir::new().unwrap();
        let img = ImageBuffer::filled(16, 8, PixelType::Bgr8, &[40, 80, 160]).unwrap();

        let png = dir.path().join("out.png");
        save_image(&png, &img, 95).unwrap();
        assert_eq!(imgduo_io::read(&png).unwrap(), img);

        let jpg = dir.path().join("out.jpg");
        save_image(&jpg, &img, 90).unwrap();
        assert_eq!(imgduo_io::Format::detect(&jpg).unwrap(), imgduo_io::Format::Jpeg);
        assert_eq!(imgduo_io::read(&jpg).unwrap().dimensions(), (16, 8));

        assert!(save_image(&dir.path().join("out.xyz"), &img, 95).is_err());
    }
}
