//! Wallets.
//!
//! An ordinary [`Wallet`] holds a P-256 ECDSA keypair and derives a
//! `VERSION_ECDSA` address from it for sending and receiving coins. A
//! [`KemWallet`] holds a Kyber-768 keypair and derives a `VERSION_KEM`
//! address; it exists to back a DID document's `KemJsonKey2025`
//! verification method rather than to move coins.

use serde::{Deserialize, Serialize};

use crate::crypto::address::{VERSION_ECDSA, VERSION_KEM, encode_address, get_pub_key_hash};
use crate::crypto::{ecdsa, kem};
use crate::error::Result;

#[derive(Clone, Serialize, Deserialize)]
pub struct Wallet {
    pkcs8_private_key: Vec<u8>,
    public_key: Vec<u8>,
}

impl Wallet {
    /// Generates a fresh P-256 ECDSA keypair.
    pub fn new() -> Result<Wallet> {
        let (pkcs8_private_key, public_key) = ecdsa::generate_keypair()?;
        Ok(Wallet {
            pkcs8_private_key,
            public_key,
        })
    }

    /// `base58(VERSION_ECDSA ‖ hash_pub_key(public_key) ‖ checksum)`.
    pub fn get_address(&self) -> String {
        encode_address(VERSION_ECDSA, &self.public_key)
    }

    pub fn get_public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The PKCS#8-encoded private key, used by the signing path in
    /// `domain::transaction`.
    pub fn get_pkcs8(&self) -> &[u8] {
        &self.pkcs8_private_key
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct KemWallet {
    decapsulation_key: Vec<u8>,
    encapsulation_key: Vec<u8>,
}

impl KemWallet {
    /// Generates a fresh Kyber-768 keypair.
    pub fn new() -> KemWallet {
        let (encapsulation_key, decapsulation_key) = kem::generate_keypair();
        KemWallet {
            decapsulation_key,
            encapsulation_key,
        }
    }

    /// `base58(VERSION_KEM ‖ hash_pub_key(encapsulation_key) ‖ checksum)`.
    pub fn get_address(&self) -> String {
        encode_address(VERSION_KEM, &self.encapsulation_key)
    }

    pub fn get_encapsulation_key(&self) -> &[u8] {
        &self.encapsulation_key
    }

    pub fn get_decapsulation_key(&self) -> &[u8] {
        &self.decapsulation_key
    }
}

impl Default for KemWallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a base58check address of either known version.
pub fn validate_address(address: &str) -> Result<()> {
    crate::crypto::address::validate_address(address)
}

/// Extracts the pubkey hash locked into a wallet (ECDSA) address.
pub fn extract_pub_key_hash(address: &str) -> Result<Vec<u8>> {
    get_pub_key_hash(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_round_trips_through_validation() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();
        assert!(validate_address(&address).is_ok());
    }

    #[test]
    fn kem_wallet_address_uses_kem_version() {
        let wallet = KemWallet::new();
        let address = wallet.get_address();
        let (version, _) = crate::crypto::address::decode_address(&address).unwrap();
        assert_eq!(version, VERSION_KEM);
    }

    #[test]
    fn extract_pub_key_hash_matches_wallet() {
        let wallet = Wallet::new().unwrap();
        let address = wallet.get_address();
        let hash = extract_pub_key_hash(&address).unwrap();
        assert_eq!(hash, crate::crypto::hash::hash_pub_key(wallet.get_public_key()));
    }
}
