//! # imgduo-engine
//!
//! A two-slot image editing session.
//!
//! The engine holds a *primary* and a *secondary* image, runs operators on
//! them and derives which operators are currently legal:
//!
//! - [`BufferStore`] owns both slots (load, swap, release, clone)
//! - [`catalog`] validates and runs the nine operators
//! - [`reconcile()`] adapts the secondary image before dual-image operators
//! - [`EnablementSet`] is derived from slot occupancy alone
//! - [`to_displayable`] turns a slot into a bitmap for presentation
//! - [`Session`] ties these together around a pluggable loader
//! - [`Worker`] serializes access to a session from other threads
//!
//! # Quick Start
//!
//! ```ignore
//! use imgduo_engine::{Operator, Session, Slot};
//! use std::path::Path;
//!
//! let mut session = Session::new();
//! session.load_path(Slot::Primary, Path::new("left.jpg"))?;
//! session.load_path(Slot::Secondary, Path::new("right.jpg"))?;
//! assert!(session.is_enabled(Operator::Stitch));
//! session.apply(Operator::Stitch)?;
//! ```
//!
//! # Operators
//!
//! | Operator | Needs | Result |
//! |----------|-------|--------|
//! | `sharpen` | primary | 3x3 sharpening kernel |
//! | `grayscale` | primary | BT.601 luminance |
//! | `edge-detect` | primary | Canny, thresholds 100/200 |
//! | `gamma` | primary | gamma 0.5 lookup table |
//! | `beautify` | primary | bilateral filter 9/75/75 |
//! | `swap` | both | slots exchanged |
//! | `blend` | both | 50/50 blend, secondary released |
//! | `stitch` | both | panorama, secondary released |
//! | `texture-transfer` | both | seamless clone, secondary released |
//!
//! # Outcomes
//!
//! Every operator returns an [`EngineResult`]. A rejected or failed
//! operator leaves both slots as they were; a failed load empties only the
//! slot it targeted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod catalog;
pub mod enablement;
mod error;
pub mod messages;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod worker;

pub use bridge::{fit_within, to_displayable, DisplayBitmap, DisplayFormat};
pub use catalog::Effect;
pub use enablement::{EnablementSet, Operator};
pub use error::{EngineError, EngineResult, Failure, Missing};
pub use messages::{Command, Event};
pub use reconcile::{reconcile, Reconciled, Steps};
pub use session::{Presenter, Session, DEFAULT_SURFACE};
pub use store::{BufferStore, Slot};
pub use worker::{SessionHandler, Worker};
