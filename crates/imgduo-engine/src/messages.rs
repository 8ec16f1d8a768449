//! Message types for caller <-> worker communication.
//!
//! Callers send [`Command`]s, the worker answers with [`Event`]s, one
//! command at a time and in order.

use std::path::PathBuf;

use crate::bridge::DisplayBitmap;
use crate::enablement::{EnablementSet, Operator};
use crate::store::Slot;

/// Messages to the worker thread.
#[derive(Debug, Clone)]
pub enum Command {
    /// Decode a file into a slot.
    Load {
        /// Target slot.
        slot: Slot,
        /// File to decode.
        path: PathBuf,
    },

    /// Run an operator.
    Apply(Operator),

    /// Empty a slot.
    Release(Slot),

    /// Set the display surface size.
    SetSurface((u32, u32)),

    /// Re-send both slot bitmaps and the enablement.
    Refresh,

    /// Stop the worker.
    Close,
}

/// Events from the worker thread.
#[derive(Debug)]
pub enum Event {
    /// A slot's display content changed; `None` means show the placeholder.
    SlotChanged {
        /// Slot to redraw.
        slot: Slot,
        /// New bitmap.
        bitmap: Option<DisplayBitmap>,
        /// Size to draw it at.
        fitted: (u32, u32),
    },

    /// Enablement after the last command.
    Enablement(EnablementSet),

    /// An operator ran.
    Applied(Operator),

    /// A command was refused or failed; the message is user-facing.
    Error(String),
}
