//! Operator enablement derived from slot occupancy.
//!
//! | primary | secondary | enabled |
//! |---------|-----------|---------|
//! | no      | any       | nothing |
//! | yes     | no        | single-image operators |
//! | yes     | yes       | all operators |

use std::fmt;

/// The operator catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// 3x3 sharpening kernel.
    Sharpen,
    /// Luminance reduction.
    Grayscale,
    /// Canny edges.
    EdgeDetect,
    /// Gamma 0.5 lookup table.
    Gamma,
    /// Bilateral smoothing.
    Beautify,
    /// Exchange primary and secondary.
    Swap,
    /// Equal-weight blend.
    Blend,
    /// Panorama assembly.
    Stitch,
    /// Seamless clone of the secondary's center into the primary.
    TextureTransfer,
}

impl Operator {
    /// Every operator, single-image ones first.
    pub const ALL: [Self; 9] = [
        Self::Sharpen,
        Self::Grayscale,
        Self::EdgeDetect,
        Self::Gamma,
        Self::Beautify,
        Self::Swap,
        Self::Blend,
        Self::Stitch,
        Self::TextureTransfer,
    ];

    /// True for operators that need both images.
    pub const fn is_dual(self) -> bool {
        matches!(self, Self::Swap | Self::Blend | Self::Stitch | Self::TextureTransfer)
    }

    /// True for operators that release the secondary slot on success.
    pub const fn consumes_secondary(self) -> bool {
        matches!(self, Self::Blend | Self::Stitch | Self::TextureTransfer)
    }

    /// Command-line name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sharpen => "sharpen",
            Self::Grayscale => "grayscale",
            Self::EdgeDetect => "edge-detect",
            Self::Gamma => "gamma",
            Self::Beautify => "beautify",
            Self::Swap => "swap",
            Self::Blend => "blend",
            Self::Stitch => "stitch",
            Self::TextureTransfer => "texture-transfer",
        }
    }

    /// Looks an operator up by [`Operator::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of currently permitted operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnablementSet(u16);

impl EnablementSet {
    /// Computes the set from `(primary valid, secondary valid)`.
    pub fn derive(primary: bool, secondary: bool) -> Self {
        let bits = Operator::ALL
            .into_iter()
            .filter(|op| primary && (secondary || !op.is_dual()))
            .fold(0, |acc, op| acc | op.bit());
        Self(bits)
    }

    /// True if `op` may run.
    pub fn is_enabled(self, op: Operator) -> bool {
        self.0 & op.bit() != 0
    }

    /// Enabled operators in catalog order.
    pub fn iter(self) -> impl Iterator<Item = Operator> {
        Operator::ALL.into_iter().filter(move |&op| self.is_enabled(op))
    }

    /// Number of enabled operators.
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if nothing is enabled.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
