//! The single session event queue.
//!
//! Control-connection pushes and per-transfer events race against each
//! other and against awaited replies; they are serialized by funneling
//! everything through one single-consumer mpsc channel drained by the
//! session's owner. No scheduling guarantees beyond the channel order
//! are assumed.

use tokio::sync::mpsc;

use crate::control::ControlEvent;
use crate::transfer::TransferEvent;

/// Default depth of the session event queue.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One event delivered to the session core.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Unsolicited push from the control connection.
    Control(ControlEvent),
    /// Status/progress/data event from one transfer connection.
    Transfer {
        reference: u32,
        event: TransferEvent,
    },
}

/// Create the session event queue.
pub fn event_channel(capacity: usize) -> (mpsc::Sender<SessionEvent>, mpsc::Receiver<SessionEvent>) {
    mpsc::channel(capacity)
}
