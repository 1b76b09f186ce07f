//! DID overlay: documents are ordinary transaction payloads, resolution is
//! a chain scan, and authentication is a signed-challenge handshake.

pub mod challenge;
pub mod document;
pub mod resolver;

pub use challenge::ChallengeStore;
pub use document::{DidDocument, did_for_pub_key};
pub use resolver::resolve;
