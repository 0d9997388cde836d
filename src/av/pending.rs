//! In-flight frame bookkeeping between a decode context and its hardware session.
//!
//! Every submitted chunk gets a ticket at the tail of a FIFO queue. The session reports
//! decoded images through [`DecoderOutput`], which pairs each image with the ticket at the
//! head of the queue. The pairing is checked by timestamp: a completion with nothing
//! pending, or with a different timestamp, means the session reordered or invented work,
//! and the context is marked failed.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::DecodedImage;
use crate::error::{Result, RfbError};

/// What happens to a ticket's image once it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retention {
    /// Submitted by a decode call that is still running; keep the image until it decides
    Undecided,
    /// Handed to the display through a [`PendingFrame`]
    Retained,
    /// Only needed for ordering
    Released,
}

struct TicketSlot {
    retention: Retention,
    completed: bool,
    cancelled: bool,
    image: Option<Box<dyn DecodedImage>>,
    signal: Option<oneshot::Sender<()>>,
}

impl TicketSlot {
    fn complete(&mut self, image: Box<dyn DecodedImage>) {
        self.completed = true;
        if self.retention != Retention::Released {
            self.image = Some(image);
        }
        if let Some(signal) = self.signal.take() {
            let _ = signal.send(());
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.image = None;
        self.signal = None;
    }
}

type SharedSlot = Arc<Mutex<TicketSlot>>;

struct Ticket {
    timestamp: i64,
    slot: SharedSlot,
}

/// A ticket created by the running decode call, not yet retained or released.
pub(crate) struct PendingTicket {
    timestamp: i64,
    slot: SharedSlot,
    ready: oneshot::Receiver<()>,
}

impl PendingTicket {
    pub(crate) fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Drops the image now or as soon as it completes.
    pub(crate) fn release(self) {
        let mut slot = self.slot.lock();
        slot.retention = Retention::Released;
        slot.image = None;
    }

    /// Keeps the image for the display.
    pub(crate) fn retain(self) -> PendingFrame {
        self.slot.lock().retention = Retention::Retained;
        PendingFrame {
            timestamp: self.timestamp,
            slot: self.slot,
            ready: Some(self.ready),
        }
    }
}

struct OutputState {
    pending: VecDeque<Ticket>,
    fatal: Option<RfbError>,
    closed: bool,
}

impl OutputState {
    fn fail(&mut self, err: RfbError) -> RfbError {
        log::error!("decode context failed: {}", err);
        if self.fatal.is_none() {
            self.fatal = Some(err.clone());
        }
        err
    }

    fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        for ticket in self.pending.drain(..) {
            ticket.slot.lock().cancel();
        }
        cancelled
    }
}

/// Completion handle given to a hardware session.
///
/// Cloneable and thread-safe, so sessions may report from their own threads. Errors
/// returned here are fatal for the owning decode context: they are also kept and reported
/// by every later decode call until the context is reset.
#[derive(Clone)]
pub struct DecoderOutput {
    state: Arc<Mutex<OutputState>>,
}

impl fmt::Debug for DecoderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DecoderOutput")
            .field("pending", &state.pending.len())
            .field("fatal", &state.fatal)
            .field("closed", &state.closed)
            .finish()
    }
}

impl Default for DecoderOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderOutput {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(OutputState {
                pending: VecDeque::new(),
                fatal: None,
                closed: false,
            })),
        }
    }

    /// Delivers a decoded image. It must belong to the oldest pending submission.
    pub fn output(&self, image: Box<dyn DecodedImage>) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            log::debug!(
                "releasing frame {} for a closed decode context",
                image.timestamp()
            );
            return Ok(());
        }
        if let Some(err) = &state.fatal {
            return Err(err.clone());
        }

        let ticket = match state.pending.pop_front() {
            Some(ticket) => ticket,
            None => {
                return Err(state.fail(RfbError::Desync(format!(
                    "received frame {} with nothing pending",
                    image.timestamp()
                ))))
            }
        };

        if ticket.timestamp != image.timestamp() {
            ticket.slot.lock().cancel();
            return Err(state.fail(RfbError::Desync(format!(
                "expected frame {}, received frame {}",
                ticket.timestamp,
                image.timestamp()
            ))));
        }

        ticket.slot.lock().complete(image);
        Ok(())
    }

    /// Reports a session failure. There is no retry; the context stays failed.
    pub fn error(&self, message: impl Into<String>) -> RfbError {
        self.state
            .lock()
            .fail(RfbError::Hardware(message.into()))
    }

    /// The error recorded by an earlier completion, if any
    pub fn check(&self) -> Result<()> {
        match &self.state.lock().fatal {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub(crate) fn enqueue(&self, timestamp: i64) -> PendingTicket {
        let (signal, ready) = oneshot::channel();
        let slot = Arc::new(Mutex::new(TicketSlot {
            retention: Retention::Undecided,
            completed: false,
            cancelled: false,
            image: None,
            signal: Some(signal),
        }));

        self.state.lock().pending.push_back(Ticket {
            timestamp,
            slot: slot.clone(),
        });

        PendingTicket {
            timestamp,
            slot,
            ready,
        }
    }

    /// Removes the newest ticket after its submission was rejected.
    pub(crate) fn withdraw(&self, timestamp: i64) {
        let mut state = self.state.lock();
        if state.pending.back().map(|t| t.timestamp) == Some(timestamp) {
            if let Some(ticket) = state.pending.pop_back() {
                ticket.slot.lock().cancel();
            }
        }
    }

    /// Cancels every pending ticket, e.g. when the session is replaced.
    pub(crate) fn cancel_pending(&self) -> usize {
        self.state.lock().cancel_all()
    }

    /// Cancels pending tickets and releases any completion that arrives afterwards.
    pub(crate) fn shutdown(&self) -> usize {
        let mut state = self.state.lock();
        state.closed = true;
        state.cancel_all()
    }
}

/// A frame handed to the display before the hardware finished decoding it.
///
/// Owns the decoded image once it completes. Dropping the handle releases the image.
pub struct PendingFrame {
    timestamp: i64,
    slot: SharedSlot,
    ready: Option<oneshot::Receiver<()>>,
}

impl fmt::Debug for PendingFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("PendingFrame")
            .field("timestamp", &self.timestamp)
            .field("completed", &slot.completed)
            .field("cancelled", &slot.cancelled)
            .finish()
    }
}

impl PendingFrame {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_ready(&self) -> bool {
        self.slot.lock().completed
    }

    /// The owning context was torn down before the image arrived
    pub fn is_cancelled(&self) -> bool {
        self.slot.lock().cancelled
    }

    /// Takes the image if it has completed.
    pub fn try_take(&mut self) -> Option<Box<dyn DecodedImage>> {
        self.slot.lock().image.take()
    }

    /// Waits for the hardware to finish this frame. Returns `None` if it was cancelled.
    pub async fn ready(&mut self) -> Option<Box<dyn DecodedImage>> {
        if let Some(ready) = self.ready.take() {
            let _ = ready.await;
        }
        self.try_take()
    }
}
