//! Tracker directory-service contract.
//!
//! A tracker is consumed as a single fetch call plus an explicit
//! disconnect; it shares the request-object-with-completion-channel
//! shape of the control contract.

use tokio::sync::mpsc;
use tracing::debug;

use hotwire_shared::error::ExchangeError;
use hotwire_shared::protocol::TrackerServer;

use crate::control::ReplySlot;

/// Requests sent *into* the tracker-client task.
#[derive(Debug)]
pub enum TrackerRequest {
    FetchServers {
        address: String,
        port: u16,
        reply: ReplySlot<Vec<TrackerServer>>,
    },
    Disconnect,
}

/// Handle to the tracker-client task.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerRequest>,
}

impl TrackerHandle {
    pub fn new(tx: mpsc::Sender<TrackerRequest>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TrackerRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn fetch_servers(
        &self,
        address: String,
        port: u16,
    ) -> Result<Vec<TrackerServer>, ExchangeError> {
        let (reply, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(TrackerRequest::FetchServers {
                address,
                port,
                reply,
            })
            .await
            .map_err(|_| ExchangeError::LinkClosed)?;
        rx.await.unwrap_or(Err(ExchangeError::LinkClosed))
    }

    pub async fn disconnect(&self) {
        if self.tx.send(TrackerRequest::Disconnect).await.is_err() {
            debug!("tracker link already closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_servers_round_trip() {
        let (handle, mut rx) = TrackerHandle::channel(4);

        tokio::spawn(async move {
            if let Some(TrackerRequest::FetchServers { address, port, reply }) = rx.recv().await {
                assert_eq!(address, "tracker.example.net");
                assert_eq!(port, 5498);
                let _ = reply.send(Ok(vec![TrackerServer {
                    name: Some("The Vault".into()),
                    description: None,
                    address: "vault.example.net".into(),
                    port: 5500,
                    users: 12,
                }]));
            }
        });

        let servers = handle
            .fetch_servers("tracker.example.net".into(), 5498)
            .await
            .unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name.as_deref(), Some("The Vault"));
    }
}
