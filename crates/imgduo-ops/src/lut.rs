//! 256-entry lookup tables.
//!
//! A [`Lut`] maps every 8-bit sample value to a new one. Tone operators are
//! built by filling the table once and applying it per pixel per channel.

use crate::{ensure_valid, saturate_u8, OpsResult};
use imgduo_core::ImageBuffer;
use tracing::debug;

/// Exponent of the fixed gamma operator.
pub const GAMMA: f64 = 0.5;

/// Lookup table over all `u8` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lut {
    table: [u8; 256],
}

impl Lut {
    /// The identity table.
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        Self { table }
    }

    /// `round(255 * (i / 255) ^ gamma)`, clamped to `0..=255`.
    ///
    /// ```rust
    /// use imgduo_ops::lut::{Lut, GAMMA};
    ///
    /// let lut = Lut::gamma(GAMMA);
    /// assert_eq!(lut.get(0), 0);
    /// assert_eq!(lut.get(64), 128);
    /// assert_eq!(lut.get(255), 255);
    /// ```
    pub fn gamma(gamma: f64) -> Self {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = saturate_u8((i as f64 / 255.0).powf(gamma) * 255.0);
        }
        Self { table }
    }

    /// Looks up one value.
    #[inline]
    pub fn get(&self, value: u8) -> u8 {
        self.table[value as usize]
    }

    /// The raw table.
    pub fn as_slice(&self) -> &[u8; 256] {
        &self.table
    }

    /// Returns `true` if the table never decreases.
    pub fn is_monotonic(&self) -> bool {
        self.table.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Applies `lut` to every sample of every channel, alpha included.
pub fn apply_lut(image: &ImageBuffer, lut: &Lut) -> OpsResult<ImageBuffer> {
    ensure_valid(image, "apply_lut")?;
    let mut data = image.as_packed().into_owned();
    for v in &mut data {
        *v = lut.get(*v);
    }
    Ok(ImageBuffer::from_raw(image.width(), image.height(), image.pixel_type(), data)?)
}

/// Gamma correction through a [`Lut::gamma`] table.
pub fn gamma(image: &ImageBuffer, gamma: f64) -> OpsResult<ImageBuffer> {
    debug!(gamma, "gamma");
    apply_lut(image, &Lut::gamma(gamma))
}
