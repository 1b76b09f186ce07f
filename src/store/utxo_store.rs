//! Indexed unspent-transaction-output set on top of `sled`.
//!
//! Keyed by txid, each entry holds the still-unspent outputs of that
//! transaction (bincode-encoded `Vec<TXOutput>`). `update` is the
//! incremental per-block path; `reindex` rebuilds the whole index by
//! replaying every block from genesis, for when the index and the block
//! store have drifted apart.

use std::collections::HashMap;

use data_encoding::HEXLOWER;
use sled::transaction::{TransactionError, UnabortableTransactionError};
use sled::{Db, Tree};

use crate::core::block::Block;
use crate::domain::transaction::TXOutput;
use crate::error::{BtcError, Result};
use crate::store::block_store::BlockStore;

const UTXO_TREE: &str = "chainstate";

#[derive(Clone)]
pub struct UtxoStore {
    db: Db,
}

impl UtxoStore {
    pub fn new(db: Db) -> UtxoStore {
        UtxoStore { db }
    }

    fn tree(&self) -> Result<Tree> {
        self.db
            .open_tree(UTXO_TREE)
            .map_err(|e| BtcError::UTXODBconnection(e.to_string()))
    }

    /// Outputs locked to `pub_key_hash`, in no particular order.
    pub fn find_outputs(&self, pub_key_hash: &[u8]) -> Result<Vec<TXOutput>> {
        let tree = self.tree()?;
        let mut outputs = vec![];
        for entry in tree.iter() {
            let (_, bytes) = entry.map_err(|e| BtcError::GettingUTXOError(e.to_string()))?;
            let outs = decode_outputs(&bytes)?;
            outputs.extend(outs.into_iter().filter(|o| o.is_locked_with_key(pub_key_hash)));
        }
        Ok(outputs)
    }

    /// Accumulates outputs locked to `pub_key_hash` until `amount` is
    /// covered (or the index is exhausted), returning the total found and
    /// the txid-hex → output-index map needed to build spending inputs.
    pub fn find_spendable(
        &self,
        pub_key_hash: &[u8],
        amount: i64,
    ) -> Result<(i64, HashMap<String, Vec<usize>>)> {
        let tree = self.tree()?;
        let mut accumulated = 0;
        let mut unspent: HashMap<String, Vec<usize>> = HashMap::new();

        'outer: for entry in tree.iter() {
            let (key, bytes) = entry.map_err(|e| BtcError::GettingUTXOError(e.to_string()))?;
            let txid_hex = HEXLOWER.encode(&key);
            let outs = decode_outputs(&bytes)?;
            for (idx, out) in outs.iter().enumerate() {
                if out.is_locked_with_key(pub_key_hash) {
                    accumulated += out.get_value();
                    unspent.entry(txid_hex.clone()).or_default().push(idx);
                    if accumulated >= amount {
                        break 'outer;
                    }
                }
            }
        }
        Ok((accumulated, unspent))
    }

    pub fn count(&self) -> Result<usize> {
        let tree = self.tree()?;
        Ok(tree.iter().count())
    }

    /// Rebuilds the index from scratch by replaying every block held in
    /// `block_store`, oldest first.
    pub fn reindex(&self, block_store: &BlockStore) -> Result<()> {
        let tree = self.tree()?;
        tree.clear()
            .map_err(|e| BtcError::RemovingUTXOError(e.to_string()))?;

        let mut blocks: Vec<Block> = block_store.iter_from_tip().collect();
        blocks.reverse();
        for block in &blocks {
            self.apply_block(&tree, block)?;
        }
        Ok(())
    }

    /// Applies one block's spends and new outputs to the index as a single
    /// sled transaction.
    pub fn update(&self, block: &Block) -> Result<()> {
        let tree = self.tree()?;
        self.apply_block(&tree, block)
    }

    fn apply_block(&self, tree: &Tree, block: &Block) -> Result<()> {
        tree.transaction(|tx_db| {
            for tx in block.get_transactions() {
                if !tx.is_coinbase() {
                    for vin in tx.get_inputs() {
                        let Some(existing) = tx_db.get(vin.get_txid())? else {
                            continue;
                        };
                        let outs: Vec<TXOutput> =
                            decode_outputs(&existing).expect("stored utxo entry must decode");
                        let remaining: Vec<TXOutput> = outs
                            .into_iter()
                            .enumerate()
                            .filter(|(idx, _)| *idx as i64 != vin.get_vout())
                            .map(|(_, out)| out)
                            .collect();
                        if remaining.is_empty() {
                            tx_db.remove(vin.get_txid())?;
                        } else {
                            let bytes = encode_outputs(&remaining)
                                .expect("utxo entry must encode for storage");
                            tx_db.insert(vin.get_txid(), bytes)?;
                        }
                    }
                }
                let bytes = encode_outputs(tx.get_outputs())
                    .expect("utxo entry must encode for storage");
                tx_db.insert(tx.get_id(), bytes)?;
            }
            Ok::<(), UnabortableTransactionError>(())
        })
        .map_err(|e: TransactionError| BtcError::SavingUTXOError(e.to_string()))
    }
}

fn decode_outputs(bytes: &[u8]) -> Result<Vec<TXOutput>> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(outs, _)| outs)
        .map_err(|e| BtcError::UTXONotFoundError(e.to_string()))
}

fn encode_outputs(outs: &[TXOutput]) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(outs, bincode::config::standard())
        .map_err(|e| BtcError::SavingUTXOError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{TXInput, Transaction};
    use crate::domain::wallet::Wallet;

    fn temp_db(prefix: &str) -> Db {
        let dir = format!("{prefix}_{}", uuid::Uuid::new_v4());
        sled::open(dir).unwrap()
    }

    #[test]
    fn update_indexes_coinbase_output() {
        let db = temp_db("test_utxo_coinbase");
        let store = UtxoStore::new(db.clone());
        let recipient = Wallet::new().unwrap();
        let coinbase = Transaction::new_coinbase_tx(&recipient.get_address()).unwrap();
        let block = Block::generate_genesis_block(&coinbase);

        store.update(&block).unwrap();

        let pub_key_hash = crate::crypto::hash::hash_pub_key(recipient.get_public_key());
        let outs = store.find_outputs(&pub_key_hash).unwrap();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].get_value(), crate::domain::transaction::SUBSIDY);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn update_removes_spent_output() {
        let db = temp_db("test_utxo_spend");
        let store = UtxoStore::new(db.clone());
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();

        let coinbase = Transaction::new_coinbase_tx(&sender.get_address()).unwrap();
        let genesis = Block::generate_genesis_block(&coinbase);
        store.update(&genesis).unwrap();

        let prev_output = coinbase.get_outputs()[0].clone();
        let input = TXInput::new(coinbase.get_id(), 0);
        let output =
            crate::domain::transaction::TXOutput::new(crate::domain::transaction::SUBSIDY, &recipient.get_address())
                .unwrap();
        let spend = Transaction::new_utxo_transaction(
            vec![input],
            vec![output],
            sender.get_pkcs8(),
            move |_, _| Ok(prev_output.clone()),
        )
        .unwrap();
        let next = Block::new_block(genesis.get_hash().to_vec(), &[spend], 1);
        store.update(&next).unwrap();

        let sender_hash = crate::crypto::hash::hash_pub_key(sender.get_public_key());
        assert!(store.find_outputs(&sender_hash).unwrap().is_empty());

        let recipient_hash = crate::crypto::hash::hash_pub_key(recipient.get_public_key());
        assert_eq!(store.find_outputs(&recipient_hash).unwrap().len(), 1);
    }

    #[test]
    fn find_spendable_stops_once_amount_is_covered() {
        let db = temp_db("test_utxo_spendable");
        let store = UtxoStore::new(db.clone());
        let wallet = Wallet::new().unwrap();
        let coinbase = Transaction::new_coinbase_tx(&wallet.get_address()).unwrap();
        let block = Block::generate_genesis_block(&coinbase);
        store.update(&block).unwrap();

        let pub_key_hash = crate::crypto::hash::hash_pub_key(wallet.get_public_key());
        let (accumulated, unspent) = store.find_spendable(&pub_key_hash, 1).unwrap();
        assert!(accumulated >= 1);
        assert_eq!(unspent.len(), 1);
    }
}
