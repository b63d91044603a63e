//! Reader → dispatcher → writer pipeline over one agent stream.
//!
//! ```text
//!  stream ─▶ reader ─(Task)─▶ inbound ─▶ dispatcher ─▶ handler
//!                                                         │
//!  stream ◀─ writer ◀─────(String)── outbound (Outbox) ◀──┘
//! ```
//!
//! The reader and writer run as spawned tasks; the dispatcher runs on the
//! caller of [`run`]. All three observe one shared [`Lifecycle`] and exit
//! once it is stopped. Both queues are unbounded FIFO channels.

pub mod dispatcher;
pub mod lifecycle;
pub mod reader;
pub mod runner;
pub mod writer;

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::task::Task;

pub use lifecycle::{Lifecycle, LifecycleState, StopReason};
pub use runner::{run, RunOptions};

/// Sending half of the inbound queue (reader → dispatcher).
pub type InboundTx = mpsc::UnboundedSender<Task>;

/// Receiving half of the inbound queue.
pub type InboundRx = mpsc::UnboundedReceiver<Task>;

/// Create the inbound task queue.
#[must_use]
pub fn inbound_queue() -> (InboundTx, InboundRx) {
    mpsc::unbounded_channel()
}

/// Producer handle for the outbound queue.
///
/// Cloned freely; every clone feeds the same stream writer in FIFO order.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    /// Create an outbox and the receiver the stream writer drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue one line for writing.
    ///
    /// Returns `false` when the writer has gone away; the line is dropped.
    pub fn push(&self, line: impl Into<String>) -> bool {
        if self.tx.send(line.into()).is_err() {
            debug!("outbound queue closed, dropping line");
            return false;
        }
        true
    }
}
