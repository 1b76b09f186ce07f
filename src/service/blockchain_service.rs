//! Façade coordinating the block store, the UTXO index, and transaction
//! building/mining. Cloning is cheap — both stores are themselves
//! `Arc`-backed — so every gossip worker and CLI command holds its own
//! handle onto the same underlying sled database. The stores themselves are
//! synchronous (sled has no async I/O); this type exposes `async fn` only
//! where the gossip/HTTP layers that call it expect to `.await` uniformly.

use std::collections::HashMap;

use data_encoding::HEXLOWER;

use crate::core::block::Block;
use crate::core::proof_of_work::ProofOfWork;
use crate::domain::transaction::{TXInput, TXOutput, Transaction};
use crate::domain::wallet::Wallet;
use crate::error::{BtcError, Result};
use crate::store::block_store::BlockStore;
use crate::store::utxo_store::UtxoStore;

#[derive(Clone)]
pub struct BlockchainService {
    blocks: BlockStore,
    utxo: UtxoStore,
}

impl BlockchainService {
    /// Opens the block store and UTXO index at `blocks_dir`/`tree_name`
    /// without requiring a genesis block to already exist.
    pub fn open(blocks_dir: &str, tree_name: &str) -> Result<BlockchainService> {
        let blocks = BlockStore::open(blocks_dir, tree_name)?;
        let utxo = UtxoStore::new(blocks.db());
        Ok(BlockchainService { blocks, utxo })
    }

    /// Opens the store and, if it has no tip yet, mines and persists the
    /// genesis block paying `genesis_address`, reindexing the UTXO set
    /// against it.
    pub fn initialize(blocks_dir: &str, tree_name: &str, genesis_address: &str) -> Result<BlockchainService> {
        let service = BlockchainService::open(blocks_dir, tree_name)?;
        if service.blocks.tip_hash().is_none() {
            let coinbase = Transaction::new_coinbase_tx(genesis_address)?;
            let genesis_hash = service.blocks.create_genesis(&coinbase)?;
            let genesis = service
                .blocks
                .get(&genesis_hash)?
                .ok_or_else(|| BtcError::BlockchainNotFoundError("genesis block missing after create".into()))?;
            service.utxo.update(&genesis)?;
        }
        Ok(service)
    }

    pub fn tip_hash(&self) -> Result<Vec<u8>> {
        self.blocks
            .tip_hash()
            .ok_or_else(|| BtcError::BlockchainNotFoundError("no blocks persisted yet".into()))
    }

    pub fn get_best_height(&self) -> Result<usize> {
        self.blocks.tip_height()
    }

    pub fn get_block(&self, hash: &[u8]) -> Result<Option<Block>> {
        self.blocks.get(hash)
    }

    pub fn get_block_hashes(&self) -> Vec<Vec<u8>> {
        self.blocks
            .iter_from_tip()
            .map(|block| block.get_hash().to_vec())
            .collect()
    }

    /// Every persisted block paired with whether its PoW still validates,
    /// tip first — backs the `printchain` CLI command.
    pub fn print_chain(&self) -> Vec<(Block, bool)> {
        self.blocks
            .iter_from_tip()
            .map(|block| {
                let valid = ProofOfWork::new(block.clone()).validate();
                (block, valid)
            })
            .collect()
    }

    /// Scans every persisted block for the transaction with id `txid`.
    pub fn find_transaction(&self, txid: &[u8]) -> Option<Transaction> {
        self.blocks
            .iter_from_tip()
            .flat_map(|block| block.get_transactions().to_vec())
            .find(|tx| tx.get_id() == txid)
    }

    /// Resolves `(prev_txid, prev_vout)` to the output it names, by scanning
    /// the chain. Used both for signing and for verification.
    pub fn find_output(&self, prev_txid: &[u8], prev_vout: i64) -> Result<TXOutput> {
        let tx = self
            .find_transaction(prev_txid)
            .ok_or(BtcError::TransactionNotFoundError(HEXLOWER.encode(prev_txid)))?;
        tx.get_outputs()
            .get(prev_vout as usize)
            .cloned()
            .ok_or(BtcError::InvalidTransactionOutput)
    }

    /// Every transaction currently on the chain — the scan the DID overlay
    /// reuses for resolution.
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.blocks
            .iter_from_tip()
            .flat_map(|block| block.get_transactions().to_vec())
            .collect()
    }

    pub fn find_spendable(&self, pub_key_hash: &[u8], amount: i64) -> Result<(i64, HashMap<String, Vec<usize>>)> {
        self.utxo.find_spendable(pub_key_hash, amount)
    }

    pub fn find_outputs(&self, pub_key_hash: &[u8]) -> Result<Vec<TXOutput>> {
        self.utxo.find_outputs(pub_key_hash)
    }

    pub fn count_utxo(&self) -> Result<usize> {
        self.utxo.count()
    }

    pub fn reindex_utxo(&self) -> Result<()> {
        self.utxo.reindex(&self.blocks)
    }

    /// Sums every output locked to `pub_key_hash`.
    pub fn get_balance(&self, pub_key_hash: &[u8]) -> Result<i64> {
        Ok(self
            .find_outputs(pub_key_hash)?
            .iter()
            .map(|out| out.get_value())
            .sum())
    }

    /// Builds and signs a spend transaction from `sender`'s spendable
    /// outputs, paying `amount` to `to_address` and returning any remainder
    /// to `sender` as a change output.
    pub fn build_utxo_transaction(&self, sender: &Wallet, to_address: &str, amount: i64) -> Result<Transaction> {
        let pub_key_hash = crate::crypto::hash::hash_pub_key(sender.get_public_key());
        let (accumulated, unspent) = self.find_spendable(&pub_key_hash, amount)?;
        if accumulated < amount {
            return Err(BtcError::NotEnoughFunds);
        }

        let mut inputs = vec![];
        for (txid_hex, indices) in unspent {
            let txid = HEXLOWER
                .decode(txid_hex.as_bytes())
                .map_err(|e| BtcError::TransactionIdHexDecodingError(e.to_string()))?;
            for idx in indices {
                inputs.push(TXInput::new(&txid, idx as i64));
            }
        }

        let mut outputs = vec![TXOutput::new(amount, to_address)?];
        if accumulated > amount {
            outputs.push(TXOutput::new(accumulated - amount, &sender.get_address())?);
        }

        Transaction::new_utxo_transaction(inputs, outputs, sender.get_pkcs8(), |txid, vout| {
            self.find_output(txid, vout)
        })
    }

    /// Verifies every transaction, appends a coinbase paying `miner_address`,
    /// mines the block on top of the current tip, persists it, and updates
    /// the UTXO index.
    pub fn mine_block(&self, transactions: &[Transaction], miner_address: &str) -> Result<Block> {
        let mut verified = vec![];
        for tx in transactions {
            if !tx.verify(|txid, vout| self.find_output(txid, vout))? {
                return Err(BtcError::InvalidTransaction);
            }
            verified.push(tx.clone());
        }
        verified.push(Transaction::new_coinbase_tx(miner_address)?);

        let tip_hash = self.tip_hash()?;
        let tip_height = self.get_best_height()?;
        let block = Block::new_block(tip_hash, &verified, tip_height + 1);

        self.blocks.append(&block)?;
        self.utxo.update(&block)?;
        Ok(block)
    }

    /// Persists an externally-received block (e.g. via gossip) and updates
    /// the UTXO index to match.
    pub fn add_block(&self, block: &Block) -> Result<()> {
        self.blocks.append(block)?;
        self.utxo.update(block)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn initialize_creates_genesis_and_credits_address() {
        let dir = temp_dir("test_service_genesis");
        let wallet = Wallet::new().unwrap();
        let service = BlockchainService::initialize(&dir, "blocks", &wallet.get_address()).unwrap();

        assert_eq!(service.get_best_height().unwrap(), 0);
        let pub_key_hash = crate::crypto::hash::hash_pub_key(wallet.get_public_key());
        assert_eq!(
            service.get_balance(&pub_key_hash).unwrap(),
            crate::domain::transaction::SUBSIDY
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn mine_block_moves_funds_and_advances_chain() {
        let dir = temp_dir("test_service_mine");
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let service = BlockchainService::initialize(&dir, "blocks", &sender.get_address()).unwrap();

        let spend = service.build_utxo_transaction(&sender, &recipient.get_address(), 5).unwrap();
        let block = service.mine_block(&[spend], &sender.get_address()).unwrap();
        assert_eq!(block.get_height(), 1);
        assert_eq!(service.get_best_height().unwrap(), 1);

        let recipient_hash = crate::crypto::hash::hash_pub_key(recipient.get_public_key());
        assert_eq!(service.get_balance(&recipient_hash).unwrap(), 5);

        let sender_hash = crate::crypto::hash::hash_pub_key(sender.get_public_key());
        assert_eq!(
            service.get_balance(&sender_hash).unwrap(),
            crate::domain::transaction::SUBSIDY - 5 + crate::domain::transaction::SUBSIDY
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reindex_matches_incremental_update() {
        let dir = temp_dir("test_service_reindex");
        let wallet = Wallet::new().unwrap();
        let service = BlockchainService::initialize(&dir, "blocks", &wallet.get_address()).unwrap();
        let pub_key_hash = crate::crypto::hash::hash_pub_key(wallet.get_public_key());
        let before = service.get_balance(&pub_key_hash).unwrap();

        service.reindex_utxo().unwrap();
        let after = service.get_balance(&pub_key_hash).unwrap();
        assert_eq!(before, after);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
