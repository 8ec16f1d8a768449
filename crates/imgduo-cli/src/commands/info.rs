//! Image info command.
//!
//! Shows format, dimensions, pixel type and file size.

use crate::InfoArgs;
use anyhow::{Context, Result};
use imgduo_core::ImageBuffer;
use imgduo_io::{Format, ReadOptions};
use std::fs;
use std::path::Path;

/// Runs the info command.
pub fn run(args: InfoArgs, verbose: bool) -> Result<()> {
    let options = ReadOptions::new().with_mode(args.mode.into());
    for (i, path) in args.input.iter().enumerate() {
        let file_size = fs::metadata(path)
            .with_context(|| format!("Cannot stat: {}", path.display()))?
            .len();
        let format = Format::detect(path).unwrap_or(Format::Unknown);
        let image = imgduo_io::read_with(path, &options)
            .with_context(|| format!("Failed to load: {}", path.display()))?;

        if i > 0 {
            println!();
        }
        print_text(path, &image, file_size, format, verbose);
    }
    Ok(())
}

fn print_text(path: &Path, image: &ImageBuffer, file_size: u64, format: Format, verbose: bool) {
    println!("{}", path.display());
    println!("  Format:     {:?} ({})", format, format.mime_type());
    println!("  Resolution: {}x{}", image.width(), image.height());
    println!("  Type:       {} ({} channels)", image.pixel_type(), image.channels());
    println!("  File size:  {}", super::format_size(file_size));

    if verbose {
        let (min, max, mean) = stats(image);
        println!("  Pixels:     {}", image.pixel_count());
        println!("  Stride:     {} bytes", image.stride());
        println!("  Min value:  {min}");
        println!("  Max value:  {max}");
        println!("  Avg value:  {mean:.3}");
    }
}

/// Minimum, maximum and mean over all samples.
fn stats(image: &ImageBuffer) -> (u8, u8, f64) {
    let (mut min, mut max, mut sum, mut count) = (u8::MAX, u8::MIN, 0u64, 0u64);
    for row in image.rows() {
        for &v in row {
            min = min.min(v);
            max = max.max(v);
            sum += u64::from(v);
            count += 1;
        }
    }
    if count == 0 {
        return (0, 0, 0.0);
    }
    (min, max, sum as f64 / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    #[test]
    fn test_stats() {
        let img = ImageBuffer::from_raw(2, 1, PixelType::Gray8, vec![10, 30]).unwrap();
        assert_eq!(stats(&img), (10, 30, 20.0));
        assert_eq!(stats(&ImageBuffer::empty()), (0, 0, 0.0));
    }
}
