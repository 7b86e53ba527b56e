//! Per-transfer connection contract.
//!
//! Once a reference number has been negotiated over the control
//! connection, a [`TransferConnector`] opens the dedicated transfer
//! connection. The connection task pushes [`TransferEvent`]s into the
//! shared session event queue and obeys [`TransferCommand`]s until it
//! terminates or is cancelled.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::events::SessionEvent;

/// Destination mode a transfer connection is started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Persist incoming bytes to storage (file downloads).
    ToFile,
    /// Hold incoming bytes in memory (previews, banner).
    ToMemory,
}

/// Status and data events emitted by one transfer connection.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    Connecting,
    Connected,
    Progress {
        /// Completed fraction in `0.0..=1.0`.
        fraction: f64,
        time_remaining: Duration,
    },
    /// Server-reported canonical file name. Metadata only; does not
    /// alter the transfer lifecycle.
    Metadata { name: String },
    /// Terminal: the transfer failed. No further events follow.
    Failed(String),
    /// Terminal: an in-memory transfer completed.
    CompletedData(Bytes),
    /// Terminal: a to-storage transfer completed at the given location.
    CompletedFile(PathBuf),
}

/// Commands sent *into* a transfer-connection task.
#[derive(Debug, Clone, Copy)]
pub enum TransferCommand {
    Cancel {
        /// Remove any partially-written file as well.
        delete_partial: bool,
    },
}

/// Handle to one live transfer connection.
#[derive(Debug)]
pub struct TransferLink {
    reference: u32,
    cmd_tx: mpsc::UnboundedSender<TransferCommand>,
}

impl TransferLink {
    pub fn new(reference: u32, cmd_tx: mpsc::UnboundedSender<TransferCommand>) -> Self {
        Self { reference, cmd_tx }
    }

    pub fn reference(&self) -> u32 {
        self.reference
    }

    /// Cooperatively cancel the connection. The caller must stop routing
    /// this reference before calling, so no event is observed afterward.
    pub fn cancel(&self, delete_partial: bool) {
        let _ = self.cmd_tx.send(TransferCommand::Cancel { delete_partial });
    }
}

/// Opens transfer connections for negotiated reference numbers.
///
/// Implementations spawn the connection task immediately and return its
/// handle; connect/run/terminate all happen inside the task, reporting
/// through `events` tagged with the reference number.
pub trait TransferConnector {
    fn connect(
        &self,
        address: &str,
        port: u16,
        reference: u32,
        size: u64,
        mode: TransferMode,
        events: mpsc::Sender<SessionEvent>,
    ) -> TransferLink;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_reaches_the_connection_task() {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let link = TransferLink::new(9, cmd_tx);

        link.cancel(true);
        assert!(matches!(
            cmd_rx.recv().await,
            Some(TransferCommand::Cancel { delete_partial: true })
        ));
    }

    #[test]
    fn cancel_after_task_exit_is_a_no_op() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let link = TransferLink::new(9, cmd_tx);
        drop(cmd_rx);

        // Must not panic; the connection already terminated.
        link.cancel(false);
    }
}
