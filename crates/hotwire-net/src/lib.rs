// Channel-based contracts for the three external connections: the
// persistent control connection, per-transfer connections, and the
// tracker directory service. The wire codecs behind them are external;
// this crate fixes the request, reply, and event shapes they must speak.

pub mod control;
pub mod events;
pub mod tracker;
pub mod transfer;

pub use control::{ControlEvent, ControlHandle, ControlRequest, ReplySlot};
pub use events::{event_channel, SessionEvent, EVENT_CHANNEL_CAPACITY};
pub use tracker::{TrackerHandle, TrackerRequest};
pub use transfer::{
    TransferCommand, TransferConnector, TransferEvent, TransferLink, TransferMode,
};
