//! Blocks.
//!
//! `pre_block_hash` and `hash` are raw 32-byte SHA-256 digests — hex only at
//! the CLI/display boundary (`HEXLOWER`), never in the canonical PoW header
//! or in storage keys, which key directly off the raw bytes.

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sled::IVec;

use super::proof_of_work::ProofOfWork;
use crate::crypto::hash::{current_timestamp_millis, sha256_digest};
use crate::domain::transaction::Transaction;
use crate::error::{BtcError, Result};

#[derive(Clone, Serialize, Deserialize)]
pub struct Block {
    timestamp: i64,
    pre_block_hash: Vec<u8>,
    hash: Vec<u8>,
    transactions: Vec<Transaction>,
    nonce: i64,
    height: usize,
}

impl Block {
    /// Assembles a block and runs proof-of-work to fill in `nonce`/`hash`.
    pub fn new_block(pre_block_hash: Vec<u8>, transactions: &[Transaction], height: usize) -> Block {
        let mut block = Block {
            timestamp: current_timestamp_millis(),
            pre_block_hash,
            hash: vec![],
            transactions: transactions.to_vec(),
            nonce: 0,
            height,
        };
        let pow = ProofOfWork::new(block.clone());
        let (nonce, hash) = pow.run();
        block.nonce = nonce;
        block.hash = hash;
        block
    }

    pub fn generate_genesis_block(coinbase: &Transaction) -> Block {
        Block::new_block(vec![], &[coinbase.clone()], 0)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| BtcError::BlockSerializationError(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Block> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(block, _)| block)
            .map_err(|e| BtcError::BlockDeserializationError(e.to_string()))
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_pre_block_hash(&self) -> &[u8] {
        &self.pre_block_hash
    }

    pub fn get_hash(&self) -> &[u8] {
        &self.hash
    }

    pub fn get_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.hash)
    }

    pub fn get_pre_block_hash_hex(&self) -> String {
        HEXLOWER.encode(&self.pre_block_hash)
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_nonce(&self) -> i64 {
        self.nonce
    }

    pub fn get_height(&self) -> usize {
        self.height
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.pre_block_hash.is_empty()
    }

    /// Pairwise SHA-256 over each transaction's canonical serialization,
    /// duplicating the last leaf when a layer has an odd count, collapsed
    /// to a single root.
    pub fn merkle_root(&self) -> Vec<u8> {
        let mut layer: Vec<Vec<u8>> = self
            .transactions
            .iter()
            .map(|tx| tx.serialize().expect("transaction must serialize for merkle root"))
            .collect();

        while layer.len() > 1 {
            if layer.len() % 2 == 1 {
                layer.push(layer.last().expect("checked non-empty above").clone());
            }
            layer = layer
                .chunks(2)
                .map(|pair| {
                    let mut concat = Vec::with_capacity(pair[0].len() + pair[1].len());
                    concat.extend_from_slice(&pair[0]);
                    concat.extend_from_slice(&pair[1]);
                    sha256_digest(&concat)
                })
                .collect();
        }
        layer.into_iter().next().unwrap_or_default()
    }
}

impl From<Block> for IVec {
    fn from(block: Block) -> Self {
        let bytes = block.serialize().expect("block must serialize for storage");
        IVec::from(bytes)
    }
}
