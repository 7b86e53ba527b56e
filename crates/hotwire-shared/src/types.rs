use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of the control connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

// Server-assigned user id, unique within a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u16);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server the client can connect to, either entered manually or
/// taken from a tracker listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub port: u16,
    pub users: u32,
}

/// Presence flags carried in a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserFlags(pub u16);

impl UserFlags {
    pub const IDLE: u16 = 1 << 0;
    pub const ADMIN: u16 = 1 << 1;
    pub const REFUSE_PRIVATE_MESSAGES: u16 = 1 << 2;
    pub const REFUSE_PRIVATE_CHAT: u16 = 1 << 3;

    pub fn contains(&self, flag: u16) -> bool {
        self.0 & flag != 0
    }
}

/// A user currently present on the server.
///
/// Owned exclusively by the roster; the chat log refers to users by
/// name only and never holds a copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub icon_id: u16,
    pub flags: UserFlags,
}

impl User {
    pub fn is_idle(&self) -> bool {
        self.flags.contains(UserFlags::IDLE)
    }

    pub fn is_admin(&self) -> bool {
        self.flags.contains(UserFlags::ADMIN)
    }
}

/// Options sent alongside the client's own user info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserOptions(pub u16);

impl UserOptions {
    pub const REFUSE_PRIVATE_MESSAGES: u16 = 1 << 0;
    pub const REFUSE_PRIVATE_CHAT: u16 = 1 << 1;
    pub const AUTOMATIC_RESPONSE: u16 = 1 << 2;

    pub fn contains(&self, option: u16) -> bool {
        self.0 & option != 0
    }
}

/// Capability set granted by the server after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessFlags(pub u64);

impl AccessFlags {
    pub const DELETE_FILE: u64 = 1 << 0;
    pub const UPLOAD_FILE: u64 = 1 << 1;
    pub const DOWNLOAD_FILE: u64 = 1 << 2;
    pub const CREATE_FOLDER: u64 = 1 << 5;
    pub const SEND_CHAT: u64 = 1 << 10;
    pub const OPEN_CHAT: u64 = 1 << 11;
    pub const POST_NEWS: u64 = 1 << 20;
    pub const BROADCAST: u64 = 1 << 32;

    pub fn contains(&self, flag: u64) -> bool {
        self.0 & flag != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMessageKind {
    /// An ordinary broadcast chat line.
    Message,
    /// A presence notice ("X joined", "X left").
    Status,
    /// The server's usage agreement text.
    Agreement,
}

/// One entry of the append-only chat log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub kind: ChatMessageKind,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, kind: ChatMessageKind) -> Self {
        Self {
            text: text.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    File,
    Folder,
}

/// One entry of the server's file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    /// Root-relative path, including this entry's own name as the
    /// trailing segment.
    pub path: Vec<String>,
    pub kind: FileKind,
    pub size: u64,
    /// Four-character type code advertised by the server, if any.
    pub file_type: Option<String>,
    /// Four-character creator code advertised by the server, if any.
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsKind {
    Bundle,
    Category,
    Article,
}

/// One entry of the server's news tree.
///
/// Bundles and categories are expandable containers; articles are leaf
/// content addressed by `article_id` and fetched in one of the
/// advertised `flavors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEntry {
    pub name: String,
    pub path: Vec<String>,
    pub kind: NewsKind,
    /// Child count advertised by the server for containers.
    pub count: u32,
    pub article_id: Option<u32>,
    pub author: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Content variants available for an article (MIME-style names).
    pub flavors: Vec<String>,
}

/// One in-flight (or terminally failed) transfer as observed by the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferInfo {
    /// Server-issued reference number correlating this transfer to its
    /// dedicated connection.
    pub reference: u32,
    pub title: String,
    /// Expected size of the transfer in bytes.
    pub size: u64,
    /// Completed fraction in `0.0..=1.0`.
    pub progress: f64,
    pub time_remaining: Duration,
    pub failed: bool,
    pub completed: bool,
    /// Destination of a completed download.
    pub file_path: Option<PathBuf>,
}

impl TransferInfo {
    pub fn new(reference: u32, title: impl Into<String>, size: u64) -> Self {
        Self {
            reference,
            title: title.into(),
            size,
            progress: 0.0,
            time_remaining: Duration::ZERO,
            failed: false,
            completed: false,
            file_path: None,
        }
    }
}
