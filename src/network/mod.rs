//! Peer gossip: wire framing, the known-peer list, and the dispatcher that
//! drives handshake/sync/relay/mining off them.

pub mod gossip;
pub mod peers;
pub mod wire;

pub use gossip::{Dispatcher, handshake, listen};
pub use peers::Nodes;
pub use wire::{Message, OpType};
