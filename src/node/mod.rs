//! Node orchestration: `NodeContext`, the shared handle the CLI, the DID
//! HTTP service, and the gossip listener coordinate through.

pub mod context;

pub use context::NodeContext;
