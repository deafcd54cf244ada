//! Raw-TCP peer networking: length-prefixed JSON framing, status/sync
//! reconciliation, live-block propagation, and tx gossip (§4.8).

pub mod equivocation;
pub mod error;
pub mod message;
pub mod network;

pub use equivocation::EquivocationRegistry;
pub use error::NetworkError;
pub use message::{read_message, write_message, Message};
pub use network::{Network, PeerHandle};
