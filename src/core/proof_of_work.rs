//! Proof-of-work nonce search.
//!
//! The header bytes hashed are `prev_hash ‖ merkle_root ‖ int64_be(timestamp)
//! ‖ int64_be(TARGET_BITS) ‖ int64_be(nonce)`. `int64_be` reproduces a quirk
//! of the wire encoding it is grounded on: it writes hex nibbles into the
//! low-order bytes of a 16-byte buffer right-to-left and leaves any
//! unfilled high-order bytes as NUL rather than the ASCII digit `'0'`. Every
//! node must encode timestamps/nonces this exact way or headers diverge.

use std::ops::ShlAssign;

use data_encoding::HEXLOWER;
use num_bigint::{BigInt, Sign};
use tracing::debug;

use super::block::Block;
use crate::crypto::hash::sha256_digest;

pub const TARGET_BITS: i32 = 24;
pub const MAX_NONCE: i64 = 100_000_000;

pub struct ProofOfWork {
    block: Block,
    target: BigInt,
}

impl ProofOfWork {
    pub fn new(block: Block) -> ProofOfWork {
        let mut target = BigInt::from(1);
        target.shl_assign(256 - TARGET_BITS);
        ProofOfWork { block, target }
    }

    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(self.block.get_pre_block_hash());
        data.extend_from_slice(&self.block.merkle_root());
        data.extend_from_slice(&int64_be(self.block.get_timestamp()));
        data.extend_from_slice(&int64_be(TARGET_BITS as i64));
        data.extend_from_slice(&int64_be(nonce));
        data
    }

    pub fn run(&self) -> (i64, Vec<u8>) {
        let mut nonce = 0i64;
        let mut hash = Vec::new();
        debug!(target_bits = TARGET_BITS, "mining block");
        while nonce < MAX_NONCE {
            let data = self.prepare_data(nonce);
            hash = sha256_digest(&data);
            let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
            if hash_int < self.target {
                debug!(hash = %HEXLOWER.encode(&hash), nonce, "found valid nonce");
                break;
            }
            nonce += 1;
        }
        (nonce, hash)
    }

    pub fn validate(&self) -> bool {
        let data = self.prepare_data(self.block.get_nonce());
        let hash = sha256_digest(&data);
        let hash_int = BigInt::from_bytes_be(Sign::Plus, &hash);
        hash_int < self.target
    }
}

/// Fixed-width 16-byte big-endian hex encoding used in the PoW header.
fn int64_be(value: i64) -> [u8; 16] {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut buf = [0u8; 16];
    let mut u = value as u64;
    let mut pos = 15usize;
    loop {
        if u == 0 {
            break;
        }
        buf[pos] = HEX[(u & 0xF) as usize];
        u >>= 4;
        if pos == 0 {
            break;
        }
        pos -= 1;
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::Transaction;
    use crate::domain::wallet::Wallet;

    #[test]
    fn int64_be_right_aligns_hex_digits() {
        let encoded = int64_be(0xabc);
        assert_eq!(&encoded[13..], b"abc");
        assert!(encoded[..13].iter().all(|&b| b == 0));
    }

    #[test]
    fn int64_be_of_zero_is_all_nul() {
        assert_eq!(int64_be(0), [0u8; 16]);
    }

    #[test]
    fn mined_block_validates() {
        let address = Wallet::new().unwrap().get_address();
        let tx = Transaction::new_coinbase_tx(&address).unwrap();
        let block = Block::generate_genesis_block(&tx);
        let pow = ProofOfWork::new(block);
        assert!(pow.validate());
    }
}
