//! The operator catalog.
//!
//! [`evaluate`] checks an operator's preconditions against the store and
//! computes its effect without mutating anything. [`commit`] writes an
//! effect back. Keeping the two apart means a rejected or failed operator
//! can never leave a half-updated store behind.
//!
//! | Operator | Needs | Effect on success |
//! |----------|-------|-------------------|
//! | Sharpen, Grayscale, EdgeDetect, Gamma, Beautify | primary | primary replaced |
//! | Swap | both | slots exchanged |
//! | Blend, Stitch, TextureTransfer | both | primary replaced, secondary released |

use crate::enablement::Operator;
use crate::error::{EngineError, EngineResult, Missing};
use crate::reconcile::reconcile;
use crate::store::{BufferStore, Slot};
use imgduo_core::ImageBuffer;
use imgduo_ops::clone::{centered_rect_mask, seamless_clone, CloneMode};
use imgduo_ops::color::to_gray;
use imgduo_ops::composite::blend_equal;
use imgduo_ops::edge::{canny, CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD};
use imgduo_ops::filter::{bilateral, sharpen, BILATERAL_DIAMETER, BILATERAL_SIGMA_COLOR, BILATERAL_SIGMA_SPACE};
use imgduo_ops::lut::{gamma, GAMMA};
use imgduo_ops::resize::resize_bilinear;
use imgduo_ops::{stitch, OpsResult};
use tracing::{debug, warn};

/// The change an operator wants to make.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Effect {
    /// Replace the primary image, optionally releasing the secondary.
    Replace {
        /// New primary image.
        primary: ImageBuffer,
        /// Whether the secondary slot is emptied.
        release_secondary: bool,
    },
    /// Exchange the two slots.
    Swap,
}

/// Checks `op`'s preconditions against the slot occupancy.
pub fn check(op: Operator, store: &BufferStore) -> EngineResult<()> {
    let (primary, secondary) = store.occupancy();
    let missing = if op.is_dual() {
        Missing::from_validity(primary, secondary)
    } else {
        (!primary).then_some(Missing::Primary)
    };
    match missing {
        Some(missing) => Err(EngineError::Rejected { operator: op, missing }),
        None => Ok(()),
    }
}

/// Computes the effect of `op` on the current slots.
///
/// # Errors
///
/// - [`EngineError::Rejected`] if a required slot is empty
/// - [`EngineError::Failed`] if the algorithm fails; for stitching the
///   stitcher status is kept
/// - [`EngineError::Unsupported`] for buffers the algorithm cannot handle
pub fn evaluate(op: Operator, store: &BufferStore) -> EngineResult<Effect> {
    check(op, store)?;
    debug!(operator = %op, "evaluate");
    let primary = store.primary();
    let secondary = store.secondary();

    let replace = |result: OpsResult<ImageBuffer>| -> EngineResult<Effect> {
        result
            .map(|image| Effect::Replace {
                primary: image,
                release_secondary: op.consumes_secondary(),
            })
            .map_err(|err| EngineError::failed(op, err))
    };

    match op {
        Operator::Sharpen => replace(sharpen(primary)),
        Operator::Grayscale => replace(to_gray(primary)),
        Operator::EdgeDetect => replace(canny(primary, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD)),
        Operator::Gamma => replace(gamma(primary, GAMMA)),
        Operator::Beautify => replace(bilateral(
            primary,
            BILATERAL_DIAMETER,
            BILATERAL_SIGMA_COLOR,
            BILATERAL_SIGMA_SPACE,
        )),
        Operator::Swap => Ok(Effect::Swap),
        Operator::Blend => replace(
            reconcile(primary, secondary).and_then(|other| blend_equal(primary, &other.image)),
        ),
        Operator::Stitch => replace(stitch::stitch(primary, secondary)),
        Operator::TextureTransfer => replace(texture_transfer(primary, secondary)),
    }
}

/// Pastes the center of `texture`, stretched to `base`'s size, seamlessly
/// into `base`.
///
/// The pasted region is the centered rectangle of half the width and half
/// the height.
pub fn texture_transfer(base: &ImageBuffer, texture: &ImageBuffer) -> OpsResult<ImageBuffer> {
    let stretched = resize_bilinear(texture, base.width(), base.height())?;
    let source = reconcile(base, &stretched)?.image;
    let (mask, rect) = centered_rect_mask(base.width(), base.height())?;
    seamless_clone(&source, base, &mask, rect.center(), CloneMode::Normal)
}

/// Writes `effect` into the store.
pub fn commit(effect: Effect, store: &mut BufferStore) -> EngineResult<()> {
    match effect {
        Effect::Replace {
            primary,
            release_secondary,
        } => {
            store.replace_primary(primary);
            if release_secondary {
                store.release(Slot::Secondary);
            }
            Ok(())
        }
        Effect::Swap => store.swap(),
    }
}

/// Evaluates and commits `op` in one step.
pub fn apply(op: Operator, store: &mut BufferStore) -> EngineResult<()> {
    match evaluate(op, store) {
        Ok(effect) => commit(effect, store),
        Err(err) => {
            warn!(operator = %op, error = %err, "operator not applied");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    fn loaded(primary: &ImageBuffer, secondary: Option<&ImageBuffer>) -> BufferStore {
        let mut store = BufferStore::new();
        store.load(Slot::Primary, Ok(primary)).unwrap();
        if let Some(s) = secondary {
            store.load(Slot::Secondary, Ok(s)).unwrap();
        }
        store
    }

    #[test]
    fn test_single_ops_need_primary() {
        let store = BufferStore::new();
        for op in Operator::ALL {
            let err = evaluate(op, &store).unwrap_err();
            assert!(err.is_rejected(), "{op}");
        }
    }

    #[test]
    fn test_dual_ops_name_missing_secondary() {
        let img = ImageBuffer::filled(4, 4, PixelType::Gray8, &[1]).unwrap();
        let store = loaded(&img, None);
        let err = evaluate(Operator::Blend, &store).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected {
                operator: Operator::Blend,
                missing: Missing::Secondary
            }
        ));
    }

    #[test]
    fn test_edge_detect_is_single_channel() {
        let img = ImageBuffer::filled(8, 8, PixelType::Bgr8, &[3, 4, 5]).unwrap();
        let mut store = loaded(&img, None);
        apply(Operator::EdgeDetect, &mut store).unwrap();
        assert_eq!(store.primary().pixel_type(), PixelType::Gray8);
    }

    #[test]
    fn test_gamma_brightens() {
        let img = ImageBuffer::filled(2, 2, PixelType::Gray8, &[64]).unwrap();
        let mut store = loaded(&img, None);
        apply(Operator::Gamma, &mut store).unwrap();
        assert_eq!(store.primary().pixel(0, 0), &[128]);
    }

    #[test]
    fn test_blend_releases_secondary() {
        let a = ImageBuffer::filled(6, 4, PixelType::Bgr8, &[100, 100, 100]).unwrap();
        let b = ImageBuffer::filled(3, 2, PixelType::Bgr8, &[200, 200, 200]).unwrap();
        let mut store = loaded(&a, Some(&b));
        apply(Operator::Blend, &mut store).unwrap();
        assert_eq!(store.primary().dimensions(), (6, 4));
        assert_eq!(store.primary().pixel(2, 2), &[150, 150, 150]);
        assert!(!store.is_valid(Slot::Secondary));
    }

    #[test]
    fn test_texture_transfer_of_flat_texture() {
        // A flat texture carries no gradients, so the base comes back
        let base = ImageBuffer::filled(32, 24, PixelType::Bgr8, &[70, 80, 90]).unwrap();
        let texture = ImageBuffer::filled(10, 10, PixelType::Gray8, &[250]).unwrap();
        let out = texture_transfer(&base, &texture).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn test_failed_stitch_keeps_slots() {
        let a = ImageBuffer::filled(64, 64, PixelType::Bgr8, &[10, 10, 10]).unwrap();
        let b = ImageBuffer::filled(64, 64, PixelType::Bgr8, &[20, 20, 20]).unwrap();
        let mut store = loaded(&a, Some(&b));
        let before = store.revision();
        let err = apply(Operator::Stitch, &mut store).unwrap_err();
        assert!(err.is_failed());
        assert_eq!(err.stitch_status(), Some(imgduo_ops::StitchStatus::NeedMoreImages));
        assert_eq!(store.revision(), before);
        assert_eq!(store.primary(), &a);
        assert_eq!(store.secondary(), &b);
    }
}
