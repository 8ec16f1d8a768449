//! Read and write options.

/// How decoded samples are mapped onto a buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Always 3-channel `B G R`: gray is replicated, alpha is dropped.
    #[default]
    Color,
    /// Always 1-channel luminance.
    Grayscale,
    /// Keep the file's own layout: gray stays 1-channel, anything with
    /// alpha becomes `B G R A`, everything else `B G R`.
    Unchanged,
}

/// Options for decoding images.
///
/// # Example
///
/// ```rust
/// use imgduo_io::{ColorMode, ReadOptions};
///
/// let opts = ReadOptions::new().with_mode(ColorMode::Unchanged);
/// assert_eq!(opts.mode, ColorMode::Unchanged);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Target layout. Default: [`ColorMode::Color`].
    pub mode: ColorMode,
}

impl ReadOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target layout.
    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Options for encoding images.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// JPEG quality level 1-100. Default: 95.
    pub jpeg_quality: u8,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl WriteOptions {
    /// Sets JPEG quality, clamped to 1-100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}
