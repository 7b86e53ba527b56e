//! Typed reply payloads for control-connection and tracker exchanges.
//!
//! The wire codec lives behind the connection contracts in `hotwire-net`;
//! these are the decoded shapes the session layer consumes.

use serde::{Deserialize, Serialize};

/// Reply to a login/handshake exchange.
///
/// Servers may advertise their own name and protocol version; when
/// present these override the locally-known values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReply {
    pub server_name: Option<String>,
    pub server_version: Option<u16>,
}

/// Reply to a transfer negotiation (file download, preview, or banner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReply {
    /// Server-issued reference number for the upcoming transfer
    /// connection.
    pub reference: u32,
    /// Total bytes the transfer connection will carry.
    pub transfer_size: u64,
    /// Size of the flat file, when the server reports it separately.
    pub file_size: Option<u64>,
    /// Position in the server's wait queue, if queued. Informational
    /// only; negotiation has still succeeded.
    pub waiting_count: Option<u16>,
}

/// A raw server record returned by a tracker.
///
/// Trackers occasionally list entries without a name; the session layer
/// filters those out before surfacing [`crate::types::Server`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerServer {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: String,
    pub port: u16,
    pub users: u32,
}
