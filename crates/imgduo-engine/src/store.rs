//! Buffer store: the two image slots and their lifecycle.
//!
//! Every transfer into or out of a slot is a deep copy, so no two slots
//! (or a slot and a caller) ever share pixels. Each mutation bumps a
//! revision counter that derived state keys off.

use crate::enablement::Operator;
use crate::error::{EngineError, EngineResult, Missing};
use imgduo_core::ImageBuffer;
use imgduo_io::IoError;
use std::fmt;
use tracing::{debug, info};

/// One of the two image slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The image operators write to.
    Primary,
    /// The second input of dual-image operators.
    Secondary,
}

impl Slot {
    /// Both slots, primary first.
    pub const ALL: [Self; 2] = [Self::Primary, Self::Secondary];

    /// Text shown where the slot has no image.
    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::Primary => "load first image",
            Self::Secondary => "load second image",
        }
    }

    /// Lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owner of the primary and secondary buffers.
#[derive(Debug, Default)]
pub struct BufferStore {
    primary: ImageBuffer,
    secondary: ImageBuffer,
    revision: u64,
}

impl BufferStore {
    /// Creates a store with both slots empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to a slot.
    pub fn get(&self, slot: Slot) -> &ImageBuffer {
        match slot {
            Slot::Primary => &self.primary,
            Slot::Secondary => &self.secondary,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut ImageBuffer {
        match slot {
            Slot::Primary => &mut self.primary,
            Slot::Secondary => &mut self.secondary,
        }
    }

    /// The primary buffer.
    pub fn primary(&self) -> &ImageBuffer {
        &self.primary
    }

    /// The secondary buffer.
    pub fn secondary(&self) -> &ImageBuffer {
        &self.secondary
    }

    /// True if the slot holds a valid image.
    pub fn is_valid(&self, slot: Slot) -> bool {
        self.get(slot).is_valid()
    }

    /// Validity of `(primary, secondary)`.
    pub fn occupancy(&self) -> (bool, bool) {
        (self.primary.is_valid(), self.secondary.is_valid())
    }

    /// Mutation counter, bumped by every slot change.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Stores the result of a decode.
    ///
    /// A decoded buffer is copied into the slot. A decode error, or a
    /// decoded buffer that is empty, releases the slot and is returned as
    /// [`EngineError::Decode`].
    pub fn load(&mut self, slot: Slot, decoded: Result<&ImageBuffer, IoError>) -> EngineResult<()> {
        let result = match decoded {
            Ok(img) if img.is_valid() => {
                *self.slot_mut(slot) = img.clone();
                info!(%slot, width = img.width(), height = img.height(), pixel_type = %img.pixel_type(), "slot loaded");
                Ok(())
            }
            Ok(_) => Err(IoError::DecodeError("decoder produced an empty image".into())),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => {
                self.touch();
                Ok(())
            }
            Err(source) => {
                self.release(slot);
                Err(EngineError::Decode { slot, source })
            }
        }
    }

    /// Exchanges the two slots.
    ///
    /// Both must hold valid images, otherwise nothing changes.
    pub fn swap(&mut self) -> EngineResult<()> {
        let (p, s) = self.occupancy();
        if let Some(missing) = Missing::from_validity(p, s) {
            return Err(EngineError::Rejected {
                operator: Operator::Swap,
                missing,
            });
        }
        // Slots own their pixels outright, so the exchange moves both buffers
        // in one step and leaves no storage shared between them.
        std::mem::swap(&mut self.primary, &mut self.secondary);
        self.touch();
        debug!("slots swapped");
        Ok(())
    }

    /// Empties a slot.
    pub fn release(&mut self, slot: Slot) {
        *self.slot_mut(slot) = ImageBuffer::empty();
        self.touch();
        debug!(%slot, "slot released");
    }

    /// Deep copy of a slot for read-only algorithmic use.
    pub fn clone_slot(&self, slot: Slot) -> ImageBuffer {
        self.get(slot).clone()
    }

    /// Replaces the primary image.
    pub(crate) fn replace_primary(&mut self, image: ImageBuffer) {
        info!(width = image.width(), height = image.height(), pixel_type = %image.pixel_type(), "primary replaced");
        self.primary = image;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;

    fn image(w: u32, h: u32, v: u8) -> ImageBuffer {
        ImageBuffer::filled(w, h, PixelType::Bgr8, &[v, v, v]).unwrap()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = BufferStore::new();
        assert_eq!(store.occupancy(), (false, false));
        assert!(store.primary().is_empty());
    }

    #[test]
    fn test_load_copies() {
        let mut store = BufferStore::new();
        let mut img = image(4, 3, 10);
        store.load(Slot::Primary, Ok(&img)).unwrap();
        img.set_pixel(0, 0, &[99, 99, 99]);
        assert_eq!(store.primary().pixel(0, 0), &[10, 10, 10]);
        assert_eq!(store.occupancy(), (true, false));
    }

    #[test]
    fn test_failed_load_releases_slot() {
        let mut store = BufferStore::new();
        store.load(Slot::Secondary, Ok(&image(2, 2, 1))).unwrap();
        let err = store
            .load(Slot::Secondary, Err(IoError::DecodeError("bad".into())))
            .unwrap_err();
        assert!(matches!(err, EngineError::Decode { slot: Slot::Secondary, .. }));
        assert!(!store.is_valid(Slot::Secondary));
    }

    #[test]
    fn test_empty_decode_is_failure() {
        let mut store = BufferStore::new();
        store.load(Slot::Primary, Ok(&image(2, 2, 1))).unwrap();
        let err = store.load(Slot::Primary, Ok(&ImageBuffer::empty())).unwrap_err();
        assert!(matches!(err, EngineError::Decode { slot: Slot::Primary, .. }));
        assert!(!store.is_valid(Slot::Primary));
    }

    #[test]
    fn test_swap_twice_restores() {
        let mut store = BufferStore::new();
        let (a, b) = (image(4, 3, 10), image(2, 5, 20));
        store.load(Slot::Primary, Ok(&a)).unwrap();
        store.load(Slot::Secondary, Ok(&b)).unwrap();
        store.swap().unwrap();
        assert_eq!(store.primary(), &b);
        assert_eq!(store.secondary(), &a);
        store.swap().unwrap();
        assert_eq!(store.primary(), &a);
        assert_eq!(store.secondary(), &b);
    }

    #[test]
    fn test_swap_leaves_slots_independent() {
        let mut store = BufferStore::new();
        let (a, b) = (image(4, 3, 10), image(2, 5, 20));
        store.load(Slot::Primary, Ok(&a)).unwrap();
        store.load(Slot::Secondary, Ok(&b)).unwrap();
        store.swap().unwrap();
        store.replace_primary(image(3, 3, 99));
        assert_eq!(store.secondary(), &a);
        store.release(Slot::Secondary);
        assert_eq!(store.primary(), &image(3, 3, 99));
    }

    #[test]
    fn test_swap_needs_both() {
        let mut store = BufferStore::new();
        store.load(Slot::Primary, Ok(&image(2, 2, 1))).unwrap();
        let before = store.revision();
        let err = store.swap().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected {
                operator: Operator::Swap,
                missing: Missing::Secondary
            }
        ));
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_revision_advances() {
        let mut store = BufferStore::new();
        let r0 = store.revision();
        store.load(Slot::Primary, Ok(&image(2, 2, 1))).unwrap();
        let r1 = store.revision();
        store.release(Slot::Primary);
        assert!(r0 < r1 && r1 < store.revision());
    }

    #[test]
    fn test_clone_slot_is_independent() {
        let mut store = BufferStore::new();
        store.load(Slot::Primary, Ok(&image(2, 2, 5))).unwrap();
        let mut copy = store.clone_slot(Slot::Primary);
        copy.set_pixel(1, 1, &[0, 0, 0]);
        assert_eq!(store.primary().pixel(1, 1), &[5, 5, 5]);
    }
}
