//! Append-only block store on top of `sled`.
//!
//! The tip pointer lives under the literal key `"l"` (grounded on the
//! teacher's single-tip-key convention, renamed to match the wire-protocol
//! key this spec shares with its gossip messages). `append` writes the
//! block and, if it extends the tip, the tip pointer in one sled
//! transaction, so a crash between the two writes is impossible. `sled`
//! itself is a blocking embedded store, so the whole type is synchronous;
//! callers in the async gossip/HTTP layers simply don't `.await` it.

use std::env::current_dir;
use std::sync::{Arc, RwLock};

use sled::transaction::{TransactionError, UnabortableTransactionError};
use sled::{Db, Tree};

use crate::core::block::Block;
use crate::error::{BtcError, Result};

const TIP_KEY: &str = "l";

#[derive(Clone)]
pub struct BlockStore {
    db: Db,
    tree_name: String,
    tip_hash: Arc<RwLock<Option<Vec<u8>>>>,
}

impl BlockStore {
    /// Opens (creating if absent) the sled tree at `blocks_dir()/tree_name`.
    pub fn open(blocks_dir: &str, tree_name: &str) -> Result<BlockStore> {
        let path = current_dir()
            .map_err(|e| BtcError::BlockchainDBconnection(e.to_string()))?
            .join(blocks_dir);
        let db = sled::open(path).map_err(|e| BtcError::BlockchainDBconnection(e.to_string()))?;
        let tree = db
            .open_tree(tree_name)
            .map_err(|e| BtcError::OpenBlockchainTreeError(e.to_string()))?;
        let tip_hash = tree
            .get(TIP_KEY)
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?
            .map(|ivec| ivec.to_vec());
        Ok(BlockStore {
            db,
            tree_name: tree_name.to_string(),
            tip_hash: Arc::new(RwLock::new(tip_hash)),
        })
    }

    /// Shares the underlying sled database handle, e.g. so a `UtxoStore`
    /// can open its own tree inside the same file.
    pub fn db(&self) -> Db {
        self.db.clone()
    }

    fn tree(&self) -> Result<Tree> {
        self.db
            .open_tree(&self.tree_name)
            .map_err(|e| BtcError::OpenBlockchainTreeError(e.to_string()))
    }

    pub fn tip_hash(&self) -> Option<Vec<u8>> {
        self.tip_hash
            .read()
            .expect("block store tip lock poisoned")
            .clone()
    }

    pub fn tip_height(&self) -> Result<usize> {
        match self.tip_hash() {
            None => Ok(0),
            Some(hash) => Ok(self.get(&hash)?.map(|block| block.get_height()).unwrap_or(0)),
        }
    }

    /// Creates the genesis block if the store is empty; otherwise a no-op.
    /// Returns the tip hash either way.
    pub fn create_genesis(&self, coinbase: &crate::domain::transaction::Transaction) -> Result<Vec<u8>> {
        if let Some(hash) = self.tip_hash() {
            return Ok(hash);
        }
        let genesis = Block::generate_genesis_block(coinbase);
        self.append(&genesis)?;
        Ok(genesis.get_hash().to_vec())
    }

    pub fn get(&self, hash: &[u8]) -> Result<Option<Block>> {
        let tree = self.tree()?;
        let bytes = tree
            .get(hash)
            .map_err(|e| BtcError::GetBlockchainError(e.to_string()))?;
        match bytes {
            None => Ok(None),
            Some(bytes) => Ok(Some(Block::deserialize(bytes.as_ref())?)),
        }
    }

    /// Writes `block` under its hash; if its height exceeds the current
    /// tip's (or there is no tip yet), atomically moves the tip pointer
    /// too. A block already on disk is a no-op.
    pub fn append(&self, block: &Block) -> Result<()> {
        let tree = self.tree()?;
        if tree
            .contains_key(block.get_hash())
            .map_err(|e| BtcError::SavingBlockchainError(e.to_string()))?
        {
            return Ok(());
        }

        let block_bytes = block.serialize()?;
        let current_tip = self.tip_hash();
        let should_move_tip = match &current_tip {
            None => true,
            Some(tip_hash) => {
                let tip_block = self
                    .get(tip_hash)?
                    .ok_or_else(|| BtcError::BlockchainNotFoundError("tip block missing".into()))?;
                block.get_height() > tip_block.get_height()
            }
        };

        let hash = block.get_hash().to_vec();
        tree.transaction(|tx_db| {
            tx_db.insert(hash.as_slice(), block_bytes.clone())?;
            if should_move_tip {
                tx_db.insert(TIP_KEY, hash.clone())?;
            }
            Ok::<(), UnabortableTransactionError>(())
        })
        .map_err(|e: TransactionError| BtcError::SavingBlockchainError(e.to_string()))?;

        if should_move_tip {
            *self.tip_hash.write().expect("block store tip lock poisoned") = Some(hash);
        }
        Ok(())
    }

    pub fn iter_from_tip(&self) -> BlockIterator {
        BlockIterator {
            db: self.db.clone(),
            tree_name: self.tree_name.clone(),
            current_hash: self.tip_hash(),
        }
    }
}

pub struct BlockIterator {
    db: Db,
    tree_name: String,
    current_hash: Option<Vec<u8>>,
}

impl Iterator for BlockIterator {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let hash = self.current_hash.take()?;
        let tree = self.db.open_tree(&self.tree_name).ok()?;
        let bytes = tree.get(&hash).ok()??;
        let block = Block::deserialize(bytes.as_ref()).ok()?;
        if !block.is_genesis() {
            self.current_hash = Some(block.get_pre_block_hash().to_vec());
        }
        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::Transaction;
    use crate::domain::wallet::Wallet;

    fn temp_dir_name(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4())
    }

    fn genesis_coinbase() -> Transaction {
        let address = Wallet::new().unwrap().get_address();
        Transaction::new_coinbase_tx(&address).unwrap()
    }

    #[test]
    fn create_genesis_then_append_moves_tip() {
        let dir = temp_dir_name("test_block_store");
        let store = BlockStore::open(&dir, "blocks").unwrap();
        let coinbase = genesis_coinbase();
        let genesis_hash = store.create_genesis(&coinbase).unwrap();
        assert_eq!(store.tip_hash().unwrap(), genesis_hash);
        assert_eq!(store.tip_height().unwrap(), 0);

        let next = Block::new_block(genesis_hash, &[genesis_coinbase()], 1);
        store.append(&next).unwrap();
        assert_eq!(store.tip_hash().unwrap(), next.get_hash());
        assert_eq!(store.tip_height().unwrap(), 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn append_ignores_duplicate_block() {
        let dir = temp_dir_name("test_block_store_dup");
        let store = BlockStore::open(&dir, "blocks").unwrap();
        let coinbase = genesis_coinbase();
        let genesis_hash = store.create_genesis(&coinbase).unwrap();
        let genesis = store.get(&genesis_hash).unwrap().unwrap();

        store.append(&genesis).unwrap();
        assert_eq!(store.tip_hash().unwrap(), genesis_hash);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn iter_from_tip_walks_to_genesis() {
        let dir = temp_dir_name("test_block_store_iter");
        let store = BlockStore::open(&dir, "blocks").unwrap();
        let genesis_hash = store.create_genesis(&genesis_coinbase()).unwrap();
        let block1 = Block::new_block(genesis_hash.clone(), &[genesis_coinbase()], 1);
        store.append(&block1).unwrap();

        let blocks: Vec<_> = store.iter_from_tip().collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks.last().unwrap().is_genesis());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
