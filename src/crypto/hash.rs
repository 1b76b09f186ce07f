//! SHA-256 and RIPEMD-160 primitives, and the double-SHA-256 checksum used
//! by base58check addresses.

use ring::digest::{Context, SHA256};
use ripemd::{Digest, Ripemd160};

/// SHA-256 digest of `data`.
pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    context.finish().as_ref().to_vec()
}

/// RIPEMD-160 digest of `data`.
pub fn ripemd160_digest(data: &[u8]) -> Vec<u8> {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// RIPEMD-160(SHA-256(pubkey)) — the pubkey-hash embedded in addresses and
/// locked into transaction outputs.
pub fn hash_pub_key(pub_key: &[u8]) -> Vec<u8> {
    ripemd160_digest(&sha256_digest(pub_key))
}

/// First 4 bytes of SHA-256(SHA-256(payload)), the base58check checksum.
pub fn double_sha256_checksum(payload: &[u8]) -> [u8; 4] {
    let first = sha256_digest(payload);
    let second = sha256_digest(&first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[0..4]);
    out
}

/// Milliseconds since the Unix epoch, used for the transaction's
/// informational `timestamp` field (excluded from the id hash).
pub fn current_timestamp_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as i64
}
