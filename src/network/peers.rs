//! Known-peer list.
//!
//! Grounded on the teacher's `domain/node.rs` `Nodes` (same
//! `RwLock<HashSet<..>>` shape, same method names), flattened to hold
//! `SocketAddr` directly instead of wrapping each one in a one-field `Node`
//! newtype — nothing in the gossip layer needs anything beyond the address.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::RwLock;

use crate::error::{BtcError, Result};

pub struct Nodes {
    inner: RwLock<HashSet<SocketAddr>>,
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes {
            inner: RwLock::new(HashSet::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::RwLockReadGuard<'_, HashSet<SocketAddr>>> {
        self.inner
            .read()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))
    }

    fn lock_mut(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashSet<SocketAddr>>> {
        self.inner
            .write()
            .map_err(|e| BtcError::NodesInnerPoisonedLockError(e.to_string()))
    }

    pub fn add_node(&self, addr: SocketAddr) -> Result<()> {
        self.lock_mut()?.insert(addr);
        Ok(())
    }

    pub fn add_nodes(&self, addrs: impl IntoIterator<Item = SocketAddr>) -> Result<()> {
        let mut inner = self.lock_mut()?;
        for addr in addrs {
            inner.insert(addr);
        }
        Ok(())
    }

    /// Silently drops a peer that failed to accept a connection — the
    /// gossip failure policy is eviction, not retry.
    pub fn evict_node(&self, addr: &SocketAddr) -> Result<()> {
        self.lock_mut()?.remove(addr);
        Ok(())
    }

    pub fn get_nodes(&self) -> Result<Vec<SocketAddr>> {
        Ok(self.lock()?.iter().copied().collect())
    }

    pub fn node_is_known(&self, addr: &SocketAddr) -> Result<bool> {
        Ok(self.lock()?.contains(addr))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }
}

impl Default for Nodes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn add_and_query_nodes() {
        let nodes = Nodes::new();
        nodes.add_node(addr(3000)).unwrap();
        assert!(nodes.node_is_known(&addr(3000)).unwrap());
        assert!(!nodes.node_is_known(&addr(3001)).unwrap());
        assert_eq!(nodes.len().unwrap(), 1);
    }

    #[test]
    fn evict_removes_node() {
        let nodes = Nodes::new();
        nodes.add_node(addr(3000)).unwrap();
        nodes.evict_node(&addr(3000)).unwrap();
        assert!(nodes.is_empty().unwrap());
    }

    #[test]
    fn add_nodes_bulk_inserts() {
        let nodes = Nodes::new();
        nodes.add_nodes([addr(3000), addr(3001)]).unwrap();
        assert_eq!(nodes.len().unwrap(), 2);
    }
}
