//! Kyber-768 post-quantum key-encapsulation via `pqcrypto-kyber`.
//!
//! A KEM wallet's encapsulation key (1184 bytes) is what gets embedded in a
//! DID document's `KemJsonKey2025` verification method; the decapsulation
//! key (2400 bytes) stays in the process-global KEM wallet file.

use pqcrypto_kyber::kyber768::{
    PublicKey as KyberPublicKey, SecretKey as KyberSecretKey, decapsulate, encapsulate,
    keypair as kyber_keypair,
};
use pqcrypto_traits::kem::{Ciphertext, PublicKey as _, SecretKey as _, SharedSecret as _};

use crate::error::{BtcError, Result};

pub const ENCAPSULATION_KEY_LEN: usize = 1184;
pub const DECAPSULATION_KEY_LEN: usize = 2400;

/// Generates a new Kyber-768 keypair: `(encapsulation_key, decapsulation_key)`.
pub fn generate_keypair() -> (Vec<u8>, Vec<u8>) {
    let (public_key, secret_key) = kyber_keypair();
    (public_key.as_bytes().to_vec(), secret_key.as_bytes().to_vec())
}

/// Encapsulates a fresh shared secret against `encapsulation_key`, returning
/// `(shared_secret, ciphertext)`.
pub fn encap(encapsulation_key: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let public_key = KyberPublicKey::from_bytes(encapsulation_key)
        .map_err(|e| BtcError::KemEncapError(e.to_string()))?;
    let (shared_secret, ciphertext) = encapsulate(&public_key);
    Ok((
        shared_secret.as_bytes().to_vec(),
        ciphertext.as_bytes().to_vec(),
    ))
}

/// Recovers the shared secret from `ciphertext` using `decapsulation_key`.
pub fn decap(decapsulation_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let secret_key = KyberSecretKey::from_bytes(decapsulation_key)
        .map_err(|e| BtcError::KemDecapError(e.to_string()))?;
    let ciphertext = pqcrypto_kyber::kyber768::Ciphertext::from_bytes(ciphertext)
        .map_err(|e| BtcError::KemDecapError(e.to_string()))?;
    let shared_secret = decapsulate(&ciphertext, &secret_key);
    Ok(shared_secret.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_has_expected_lengths() {
        let (encap_key, decap_key) = generate_keypair();
        assert_eq!(encap_key.len(), ENCAPSULATION_KEY_LEN);
        assert_eq!(decap_key.len(), DECAPSULATION_KEY_LEN);
    }

    #[test]
    fn encap_decap_round_trip_shares_secret() {
        let (encap_key, decap_key) = generate_keypair();
        let (shared_secret, ciphertext) = encap(&encap_key).unwrap();
        let recovered = decap(&decap_key, &ciphertext).unwrap();
        assert_eq!(shared_secret, recovered);
    }

    #[test]
    fn wrong_decapsulation_key_yields_different_secret() {
        let (encap_key, _decap_key) = generate_keypair();
        let (_other_encap_key, other_decap_key) = generate_keypair();
        let (shared_secret, ciphertext) = encap(&encap_key).unwrap();
        let recovered = decap(&other_decap_key, &ciphertext).unwrap();
        assert_ne!(shared_secret, recovered);
    }
}
