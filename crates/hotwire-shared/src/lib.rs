// Shared data types, protocol payloads, and constants for the Hotwire client.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::ExchangeError;
pub use protocol::{DownloadReply, LoginReply, TrackerServer};
pub use types::{
    AccessFlags, ChatMessage, ChatMessageKind, ConnectionStatus, FileEntry, FileKind, NewsEntry,
    NewsKind, Server, TransferInfo, User, UserFlags, UserId, UserOptions,
};
