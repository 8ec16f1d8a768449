//! An editing session: store, loader and derived enablement.

use crate::bridge::{to_displayable, DisplayBitmap};
use crate::catalog;
use crate::enablement::{EnablementSet, Operator};
use crate::error::EngineResult;
use crate::store::{BufferStore, Slot};
use imgduo_core::ImageBuffer;
use imgduo_io::{FileReader, ImageReader, IoError};
use std::cell::Cell;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Default display surface for each slot.
pub const DEFAULT_SURFACE: (u32, u32) = (640, 480);

/// Receives display updates.
///
/// Implemented by whatever shows the two slots; the session only tells it
/// what to draw.
pub trait Presenter {
    /// Draws `bitmap` for `slot` scaled into `surface`, or the slot's
    /// placeholder text when `bitmap` is `None`.
    fn present(&mut self, slot: Slot, bitmap: Option<&DisplayBitmap>, surface: (u32, u32));

    /// Called with the new enablement after every refresh.
    fn enablement_changed(&mut self, _enabled: EnablementSet) {}
}

/// Two-slot editing session.
///
/// Mutations go through [`Session::load_path`], [`Session::apply`] and
/// [`Session::release`]. Enablement is derived from the store and cached
/// per store revision.
pub struct Session {
    store: BufferStore,
    reader: Box<dyn ImageReader + Send>,
    surface: (u32, u32),
    enablement: Cell<Option<(u64, EnablementSet)>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("store", &self.store)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session reading files with default options.
    pub fn new() -> Self {
        Self::with_reader(FileReader::new())
    }

    /// Creates an empty session with a custom loader.
    pub fn with_reader<R: ImageReader + Send + 'static>(reader: R) -> Self {
        Self {
            store: BufferStore::new(),
            reader: Box::new(reader),
            surface: DEFAULT_SURFACE,
            enablement: Cell::new(None),
        }
    }

    /// Read access to the slots.
    pub fn store(&self) -> &BufferStore {
        &self.store
    }

    /// Shorthand for a slot's buffer.
    pub fn image(&self, slot: Slot) -> &ImageBuffer {
        self.store.get(slot)
    }

    /// Display surface used by [`Session::refresh`].
    pub const fn surface(&self) -> (u32, u32) {
        self.surface
    }

    /// Sets the display surface.
    pub fn set_surface(&mut self, surface: (u32, u32)) {
        self.surface = surface;
    }

    /// Decodes `path` into `slot`.
    ///
    /// On failure the slot is emptied and [`crate::EngineError::Decode`]
    /// returned.
    pub fn load_path(&mut self, slot: Slot, path: &Path) -> EngineResult<()> {
        info!(%slot, path = %path.display(), "loading");
        let decoded = self.reader.read(path);
        self.load_decoded(slot, decoded)
    }

    /// Stores an already decoded result into `slot`.
    pub fn load_decoded(&mut self, slot: Slot, decoded: Result<ImageBuffer, IoError>) -> EngineResult<()> {
        match decoded {
            Ok(image) => self.store.load(slot, Ok(&image)),
            Err(err) => self.store.load(slot, Err(err)),
        }
    }

    /// Runs an operator.
    pub fn apply(&mut self, op: Operator) -> EngineResult<()> {
        catalog::apply(op, &mut self.store)
    }

    /// Empties a slot.
    pub fn release(&mut self, slot: Slot) {
        self.store.release(slot);
    }

    /// Operators currently permitted.
    pub fn enablement(&self) -> EnablementSet {
        let revision = self.store.revision();
        if let Some((cached, set)) = self.enablement.get() {
            if cached == revision {
                return set;
            }
        }
        let (primary, secondary) = self.store.occupancy();
        let set = EnablementSet::derive(primary, secondary);
        debug!(revision, enabled = set.len(), "enablement recomputed");
        self.enablement.set(Some((revision, set)));
        set
    }

    /// True if `op` is currently permitted.
    pub fn is_enabled(&self, op: Operator) -> bool {
        self.enablement().is_enabled(op)
    }

    /// Display bitmap for a slot, `None` when it is empty.
    pub fn display(&self, slot: Slot) -> Option<DisplayBitmap> {
        to_displayable(self.store.get(slot))
    }

    /// Pushes both slots and the enablement to `presenter`.
    pub fn refresh(&self, presenter: &mut dyn Presenter) {
        for slot in Slot::ALL {
            let bitmap = self.display(slot);
            presenter.present(slot, bitmap.as_ref(), self.surface);
        }
        presenter.enablement_changed(self.enablement());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgduo_core::PixelType;
    use imgduo_io::IoResult;
    use std::path::PathBuf;

    /// Decodes `ok*` paths to a 6x4 gray image and fails everything else.
    struct FakeReader;

    impl ImageReader for FakeReader {
        fn read(&self, path: &Path) -> IoResult<ImageBuffer> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("ok") {
                Ok(ImageBuffer::filled(6, 4, PixelType::Gray8, &[9])?)
            } else {
                Err(IoError::InvalidFile(name.to_string()))
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        shown: Vec<(Slot, Option<(u32, u32)>)>,
        enabled: Option<EnablementSet>,
    }

    impl Presenter for Recorder {
        fn present(&mut self, slot: Slot, bitmap: Option<&DisplayBitmap>, surface: (u32, u32)) {
            self.shown.push((slot, bitmap.map(|b| b.fitted(surface))));
        }

        fn enablement_changed(&mut self, enabled: EnablementSet) {
            self.enabled = Some(enabled);
        }
    }

    #[test]
    fn test_enablement_follows_loads() {
        let mut session = Session::with_reader(FakeReader);
        assert!(session.enablement().is_empty());
        session.load_path(Slot::Primary, &PathBuf::from("ok.png")).unwrap();
        assert_eq!(session.enablement().len(), 5);
        session.load_path(Slot::Secondary, &PathBuf::from("ok2.png")).unwrap();
        assert_eq!(session.enablement().len(), 9);
        assert!(session.load_path(Slot::Secondary, &PathBuf::from("bad.png")).is_err());
        assert_eq!(session.enablement().len(), 5);
    }

    #[test]
    fn test_refresh_reports_placeholders() {
        let mut session = Session::with_reader(FakeReader);
        session.set_surface((12, 12));
        session.load_path(Slot::Primary, &PathBuf::from("ok.png")).unwrap();
        let mut rec = Recorder::default();
        session.refresh(&mut rec);
        assert_eq!(rec.shown, vec![(Slot::Primary, Some((12, 8))), (Slot::Secondary, None)]);
        assert_eq!(rec.enabled.map(|e| e.len()), Some(5));
    }
}
