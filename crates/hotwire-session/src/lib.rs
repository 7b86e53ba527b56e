//! Session orchestration core for a Hotline-style client.
//!
//! The crate sits between the wire layer (`hotwire-net`) and a
//! presentation layer: [`Session`] owns all session-scoped state and is
//! the single place it mutates, fed by awaited control exchanges and a
//! single-consumer event queue.

pub mod roster;
pub mod session;
pub mod transfers;
pub mod tree;

pub use roster::{RosterNotice, UserRoster};
pub use session::Session;
pub use transfers::{BannerUpdate, TransferCompletion, TransferRegistry};
pub use tree::{ListingTree, Named, NodeId};
