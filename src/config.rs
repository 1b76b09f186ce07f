//! Process-wide configuration resolved once from the environment.
//!
//! `NODE_ID` is the one required knob: it selects the per-node block-store
//! directory and ECDSA wallet file so that several nodes can run side by
//! side on one machine (see integration tests). `NODE_ID=3003` additionally
//! marks the node that runs the DID HTTP sidecar.

use once_cell::sync::Lazy;
use std::env;
use std::net::SocketAddr;

use crate::error::{BtcError, Result};

/// Node whose `NODE_ID` also starts the DID HTTP service on :8080.
pub const DID_SERVICE_NODE_ID: &str = "3003";

/// Compile-time bootstrap peer every non-bootstrap node dials on boot.
pub static BOOTSTRAP_PEER: Lazy<SocketAddr> = Lazy::new(|| {
    "127.0.0.1:3000"
        .parse()
        .expect("hard-coded bootstrap address must parse")
});

pub struct Config {
    node_id: String,
    mining_address: Option<String>,
}

impl Config {
    fn from_env() -> Result<Config> {
        let node_id = env::var("NODE_ID").map_err(|_| BtcError::MissingNodeId)?;
        let mining_address = env::var("MINING_ADDRESS").ok();
        Ok(Config {
            node_id,
            mining_address,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn is_miner(&self) -> bool {
        self.mining_address.is_some()
    }

    pub fn mining_address(&self) -> Option<&str> {
        self.mining_address.as_deref()
    }

    pub fn set_mining_address(&mut self, address: String) {
        self.mining_address = Some(address);
    }

    /// Directory sled opens the block store at: `data/node-<NODE_ID>`.
    pub fn blocks_dir(&self) -> String {
        env::var("TREE_DIR").unwrap_or_else(|_| format!("data/node-{}", self.node_id))
    }

    /// Name of the sled tree holding blocks + tip pointer.
    pub fn blocks_tree_name(&self) -> String {
        env::var("BLOCKS_TREE").unwrap_or_else(|_| "blocks".to_string())
    }

    /// Name of the sled tree holding the UTXO index.
    pub fn utxo_tree_name(&self) -> String {
        "chainstate".to_string()
    }

    /// Per-node ECDSA wallet file.
    pub fn wallet_file(&self) -> String {
        env::var("WALLET_FILE").unwrap_or_else(|_| format!("wallet_{}.dat", self.node_id))
    }

    /// Process-global KEM wallet file — not namespaced by `NODE_ID`.
    pub fn kem_wallet_file(&self) -> String {
        env::var("KEM_WALLET_FILE").unwrap_or_else(|_| "kem_wallet.dat".to_string())
    }

    pub fn starts_did_service(&self) -> bool {
        self.node_id == DID_SERVICE_NODE_ID
    }

    pub fn node_addr(&self) -> SocketAddr {
        env::var("NODE_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                let port: u16 = self.node_id.parse().unwrap_or(3000);
                SocketAddr::from(([127, 0, 0, 1], port))
            })
    }
}

/// Lazily resolved process configuration. Accessing this before `NODE_ID` is
/// set panics; every CLI command that needs a node identity is expected to
/// have it set first (see `main.rs`).
pub static GLOBAL_CONFIG: Lazy<std::sync::RwLock<Config>> =
    Lazy::new(|| std::sync::RwLock::new(Config::from_env().expect("NODE_ID must be set")));
