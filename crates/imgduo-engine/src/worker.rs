//! Serialized access to a [`Session`] from other threads.
//!
//! [`Worker::spawn`] moves a session onto its own thread. The
//! [`SessionHandler`] there processes [`Command`]s one at a time and
//! reports back with [`Event`]s, so at most one mutation is ever in flight.

use std::sync::mpsc::{channel, Receiver, SendError, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::bridge::DisplayBitmap;
use crate::enablement::EnablementSet;
use crate::messages::{Command, Event};
use crate::session::{Presenter, Session};
use crate::store::Slot;

/// Worker-side command loop.
pub struct SessionHandler {
    rx: Receiver<Command>,
    tx: Sender<Event>,
    session: Session,
}

/// Forwards presenter calls as events.
struct EventPresenter<'a> {
    tx: &'a Sender<Event>,
}

impl Presenter for EventPresenter<'_> {
    fn present(&mut self, slot: Slot, bitmap: Option<&DisplayBitmap>, surface: (u32, u32)) {
        let fitted = bitmap.map_or((0, 0), |b| b.fitted(surface));
        let _ = self.tx.send(Event::SlotChanged {
            slot,
            bitmap: bitmap.cloned(),
            fitted,
        });
    }

    fn enablement_changed(&mut self, enabled: EnablementSet) {
        let _ = self.tx.send(Event::Enablement(enabled));
    }
}

impl SessionHandler {
    /// Creates a handler around `session`.
    pub fn new(rx: Receiver<Command>, tx: Sender<Event>, session: Session) -> Self {
        Self { rx, tx, session }
    }

    /// Main loop. Returns the session when the channel closes or
    /// [`Command::Close`] arrives.
    pub fn run(mut self) -> Session {
        while let Ok(cmd) = self.rx.recv() {
            debug!(?cmd, "worker command");
            match cmd {
                Command::Close => break,
                Command::Load { slot, path } => {
                    let result = self.session.load_path(slot, &path);
                    self.finish(result.map(|()| None));
                }
                Command::Apply(op) => {
                    let result = self.session.apply(op);
                    self.finish(result.map(|()| Some(Event::Applied(op))));
                }
                Command::Release(slot) => {
                    self.session.release(slot);
                    self.refresh();
                }
                Command::SetSurface(size) => {
                    self.session.set_surface(size);
                    self.refresh();
                }
                Command::Refresh => self.refresh(),
            }
        }
        debug!("worker shutdown");
        self.session
    }

    fn send(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Reports the outcome, then redraws: enablement is re-queried after
    /// every command, failed or not.
    fn finish(&self, result: crate::EngineResult<Option<Event>>) {
        match result {
            Ok(Some(event)) => self.send(event),
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "command failed");
                self.send(Event::Error(err.to_string()));
            }
        }
        self.refresh();
    }

    fn refresh(&self) {
        let mut presenter = EventPresenter { tx: &self.tx };
        self.session.refresh(&mut presenter);
    }
}

/// Caller-side handle to a session running on a worker thread.
pub struct Worker {
    tx: Sender<Command>,
    rx: Receiver<Event>,
    handle: Option<JoinHandle<Session>>,
}

impl Worker {
    /// Moves `session` onto a new worker thread.
    pub fn spawn(session: Session) -> Self {
        let (tx_to_worker, rx_in_worker) = channel();
        let (tx_to_caller, rx_from_worker) = channel();
        let handle = thread::spawn(move || {
            SessionHandler::new(rx_in_worker, tx_to_caller, session).run()
        });
        Self {
            tx: tx_to_worker,
            rx: rx_from_worker,
            handle: Some(handle),
        }
    }

    /// Queues a command.
    pub fn send(&self, cmd: Command) -> Result<(), SendError<Command>> {
        self.tx.send(cmd)
    }

    /// Event receiver.
    pub fn events(&self) -> &Receiver<Event> {
        &self.rx
    }

    /// Stops the worker and returns its session.
    ///
    /// `None` if the worker thread panicked.
    pub fn shutdown(mut self) -> Option<Session> {
        let _ = self.tx.send(Command::Close);
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Signal worker to stop
        let _ = self.tx.send(Command::Close);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enablement::Operator;
    use imgduo_core::{ImageBuffer, PixelType};
    use imgduo_io::{ImageReader, IoResult};
    use std::path::Path;

    struct Solid;

    impl ImageReader for Solid {
        fn read(&self, _path: &Path) -> IoResult<ImageBuffer> {
            Ok(ImageBuffer::filled(8, 8, PixelType::Bgr8, &[40, 50, 60])?)
        }
    }

    #[test]
    fn test_commands_are_processed_in_order() {
        let worker = Worker::spawn(Session::with_reader(Solid));
        worker
            .send(Command::Load {
                slot: Slot::Primary,
                path: "a.png".into(),
            })
            .unwrap();
        worker.send(Command::Apply(Operator::Blend)).unwrap();
        worker.send(Command::Apply(Operator::Grayscale)).unwrap();
        let session = worker.shutdown().unwrap();

        assert_eq!(session.image(Slot::Primary).pixel_type(), PixelType::Gray8);
        assert_eq!(session.enablement().len(), 5);
    }

    #[test]
    fn test_events_report_outcomes() {
        let worker = Worker::spawn(Session::with_reader(Solid));
        worker.send(Command::Apply(Operator::Sharpen)).unwrap();
        worker
            .send(Command::Load {
                slot: Slot::Primary,
                path: "a.png".into(),
            })
            .unwrap();
        worker.send(Command::Apply(Operator::Sharpen)).unwrap();
        let rx_events: Vec<Event> = {
            let mut out = Vec::new();
            // Each command ends with an enablement event
            let mut seen = 0;
            while seen < 3 {
                let ev = worker.events().recv().unwrap();
                if matches!(ev, Event::Enablement(_)) {
                    seen += 1;
                }
                out.push(ev);
            }
            out
        };

        assert!(matches!(rx_events[0], Event::Error(_)));
        assert!(rx_events.iter().any(|e| matches!(e, Event::Applied(Operator::Sharpen))));
        let last_primary = rx_events.iter().rev().find_map(|e| match e {
            Event::SlotChanged {
                slot: Slot::Primary,
                bitmap,
                ..
            } => Some(bitmap.is_some()),
            _ => None,
        });
        assert_eq!(last_primary, Some(true));
    }
}
