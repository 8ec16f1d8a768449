//! Making a candidate image compatible with a reference before a
//! dual-image operator.
//!
//! The candidate is resized to the reference dimensions (aspect ratio is
//! not kept) and then converted to the reference pixel type. The reference
//! is never touched.

use imgduo_core::{ImageBuffer, PixelType};
use imgduo_ops::color::convert;
use imgduo_ops::resize::resize_bilinear;
use imgduo_ops::OpsResult;
use tracing::warn;

/// What [`reconcile`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Steps {
    /// Candidate was resized from these dimensions.
    pub resized_from: Option<(u32, u32)>,
    /// Candidate was converted from this pixel type.
    pub converted_from: Option<PixelType>,
}

impl Steps {
    /// True if the pair already matched.
    pub const fn is_noop(&self) -> bool {
        self.resized_from.is_none() && self.converted_from.is_none()
    }
}

/// A candidate brought into the reference's shape.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// The adjusted candidate.
    pub image: ImageBuffer,
    /// Steps that ran.
    pub steps: Steps,
}

/// Returns a copy of `candidate` with the dimensions and pixel type of
/// `reference`.
///
/// A mismatch is logged as a warning and then resolved; there is no way to
/// decline it. Reconciling an already matching pair is a plain copy.
pub fn reconcile(reference: &ImageBuffer, candidate: &ImageBuffer) -> OpsResult<Reconciled> {
    let mut steps = Steps::default();
    let mut image = if candidate.dimensions() == reference.dimensions() {
        candidate.clone()
    } else {
        steps.resized_from = Some(candidate.dimensions());
        resize_bilinear(candidate, reference.width(), reference.height())?
    };
    if image.pixel_type() != reference.pixel_type() {
        steps.converted_from = Some(image.pixel_type());
        image = convert(&image, reference.pixel_type())?;
    }

    if !steps.is_noop() {
        warn!(
            reference = ?reference.dimensions(),
            reference_type = %reference.pixel_type(),
            candidate = ?candidate.dimensions(),
            candidate_type = %candidate.pixel_type(),
            "images differ in size or type; adjusting the second image to match"
        );
    }
    Ok(Reconciled { image, steps })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_pair_is_copy() {
        let a = ImageBuffer::filled(6, 4, PixelType::Bgr8, &[1, 2, 3]).unwrap();
        let b = ImageBuffer::filled(6, 4, PixelType::Bgr8, &[9, 8, 7]).unwrap();
        let r = reconcile(&a, &b).unwrap();
        assert!(r.steps.is_noop());
        assert_eq!(r.image, b);
    }

    #[test]
    fn test_resize_and_convert() {
        let reference = ImageBuffer::new(30, 20, PixelType::Bgr8).unwrap();
        let candidate = ImageBuffer::filled(15, 10, PixelType::Gray8, &[40]).unwrap();
        let r = reconcile(&reference, &candidate).unwrap();
        assert!(r.image.same_shape(&reference));
        assert_eq!(r.steps.resized_from, Some((15, 10)));
        assert_eq!(r.steps.converted_from, Some(PixelType::Gray8));
        assert_eq!(r.image.pixel(29, 19), &[40, 40, 40]);
    }

    #[test]
    fn test_idempotent() {
        let reference = ImageBuffer::new(8, 8, PixelType::Bgra8).unwrap();
        let candidate = ImageBuffer::filled(3, 5, PixelType::Bgr8, &[5, 6, 7]).unwrap();
        let once = reconcile(&reference, &candidate).unwrap().image;
        let twice = reconcile(&reference, &once).unwrap();
        assert!(twice.steps.is_noop());
        assert_eq!(twice.image, once);
    }
}
