//! Base58check address encoding.
//!
//! An address is `base58(version ‖ pubkey_hash ‖ checksum)`. Two disjoint
//! version bytes distinguish the two key families sharing this wire format:
//! `VERSION_ECDSA` for wallet addresses, `VERSION_KEM` for KEM addresses
//! referenced from DID documents.

use crate::crypto::hash::{double_sha256_checksum, hash_pub_key};
use crate::error::{BtcError, Result};

pub const VERSION_ECDSA: u8 = 0x00;
pub const VERSION_KEM: u8 = 0x66;

const CHECKSUM_LEN: usize = 4;

/// Encodes `data` as a Base58 string.
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Decodes a Base58 string back to bytes.
pub fn base58_decode(data: &str) -> Result<Vec<u8>> {
    bs58::decode(data)
        .into_vec()
        .map_err(|e| BtcError::AddressDecodingError(e.to_string()))
}

/// Builds `base58(version ‖ hash_pub_key(pub_key) ‖ checksum)`.
pub fn encode_address(version: u8, pub_key: &[u8]) -> String {
    let pubkey_hash = hash_pub_key(pub_key);
    let mut payload = Vec::with_capacity(1 + pubkey_hash.len() + CHECKSUM_LEN);
    payload.push(version);
    payload.extend_from_slice(&pubkey_hash);
    let checksum = double_sha256_checksum(&payload);
    payload.extend_from_slice(&checksum);
    base58_encode(&payload)
}

/// Decodes an address, verifies its checksum, and returns `(version, pubkey_hash)`.
pub fn decode_address(address: &str) -> Result<(u8, Vec<u8>)> {
    let payload = base58_decode(address)?;
    if payload.len() <= 1 + CHECKSUM_LEN {
        return Err(BtcError::InvalidAddress(address.to_string()));
    }
    let (body, checksum) = payload.split_at(payload.len() - CHECKSUM_LEN);
    let expected = double_sha256_checksum(body);
    if checksum != expected {
        return Err(BtcError::InvalidAddress(address.to_string()));
    }
    let version = body[0];
    let pubkey_hash = body[1..].to_vec();
    Ok((version, pubkey_hash))
}

/// Validates that `address` has a well-formed checksum and a known version byte.
pub fn validate_address(address: &str) -> Result<()> {
    let (version, _) = decode_address(address)?;
    if version != VERSION_ECDSA && version != VERSION_KEM {
        return Err(BtcError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// Extracts the pubkey hash locked into a wallet address, rejecting KEM addresses.
pub fn get_pub_key_hash(address: &str) -> Result<Vec<u8>> {
    let (version, pubkey_hash) = decode_address(address)?;
    if version != VERSION_ECDSA {
        return Err(BtcError::InvalidAddress(address.to_string()));
    }
    Ok(pubkey_hash)
}
