//! P-256 ECDSA keypair generation, signing and verification via `ring`.
//!
//! Public keys and signatures are always carried in the wire/address form
//! the rest of the crate expects: 64 raw bytes (`X ‖ Y` for a public key,
//! `r ‖ s` for a signature), each half left-zero-padded to 32 bytes. `ring`
//! hands back public keys in uncompressed SEC1 form (`0x04 ‖ X ‖ Y`,
//! 65 bytes) and produces fixed-width `r ‖ s` signatures already, so the
//! only conversion needed is stripping that leading `0x04` tag.

use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING, EcdsaKeyPair, KeyPair,
    UnparsedPublicKey,
};

use crate::error::{BtcError, Result};

pub const PUBLIC_KEY_LEN: usize = 64;
pub const SIGNATURE_LEN: usize = 64;

/// Generates a new P-256 keypair and returns `(pkcs8_private_key, raw_public_key)`.
pub fn generate_keypair() -> Result<(Vec<u8>, Vec<u8>)> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| BtcError::EcdsaKeyGenError(e.to_string()))?;
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
        .map_err(|e| BtcError::EcdsaKeyGenError(e.to_string()))?;
    let public_key = to_raw_public_key(key_pair.public_key().as_ref())?;
    Ok((pkcs8.as_ref().to_vec(), public_key))
}

/// Strips the uncompressed SEC1 `0x04` tag, leaving `X ‖ Y` (64 bytes).
fn to_raw_public_key(sec1_uncompressed: &[u8]) -> Result<Vec<u8>> {
    if sec1_uncompressed.len() != 65 || sec1_uncompressed[0] != 0x04 {
        return Err(BtcError::InvalidPublicKey);
    }
    Ok(sec1_uncompressed[1..].to_vec())
}

/// Re-derives the raw 64-byte public key from a PKCS#8 private key.
pub fn public_key_from_pkcs8(pkcs8: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| BtcError::EcdsaSignError(e.to_string()))?;
    to_raw_public_key(key_pair.public_key().as_ref())
}

/// Signs `message` with the PKCS#8-encoded private key, returning the fixed
/// 64-byte `r ‖ s` signature.
pub fn sign_digest(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| BtcError::EcdsaSignError(e.to_string()))?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| BtcError::EcdsaSignError(e.to_string()))?;
    Ok(signature.as_ref().to_vec())
}

/// Verifies a 64-byte `r ‖ s` signature against a 64-byte raw `X ‖ Y` public key.
pub fn verify(raw_public_key: &[u8], signature: &[u8], message: &[u8]) -> Result<bool> {
    if raw_public_key.len() != PUBLIC_KEY_LEN {
        return Err(BtcError::InvalidPublicKeyLength(raw_public_key.len()));
    }
    if signature.len() != SIGNATURE_LEN {
        return Err(BtcError::InvalidSignatureLength(signature.len()));
    }

    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(raw_public_key);

    let unparsed = UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, sec1);
    Ok(unparsed.verify(message, signature).is_ok())
}

/// Left-zero-pads `value` to 32 bytes, as required for both signature halves
/// (`r`, `s`) and public key coordinates (`X`, `Y`).
pub fn pad32(value: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 32];
    let start = 32usize.saturating_sub(value.len());
    let copy_from = value.len().saturating_sub(32);
    out[start..].copy_from_slice(&value[copy_from..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let (pkcs8, pubkey) = generate_keypair().unwrap();
        let message = b"easyblock transaction digest";
        let signature = sign_digest(&pkcs8, message).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LEN);
        assert!(verify(&pubkey, &signature, message).unwrap());
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let (pkcs8, pubkey) = generate_keypair().unwrap();
        let message = b"digest";
        let mut signature = sign_digest(&pkcs8, message).unwrap();
        signature[0] ^= 0xff;
        assert!(!verify(&pubkey, &signature, message).unwrap());
    }

    #[test]
    fn wrong_length_inputs_are_rejected() {
        let (pkcs8, _pubkey) = generate_keypair().unwrap();
        let signature = sign_digest(&pkcs8, b"x").unwrap();
        assert!(verify(&[0u8; 10], &signature, b"x").is_err());
        assert!(verify(&[0u8; 64], &signature[..10], b"x").is_err());
    }

    #[test]
    fn pad32_left_pads_short_values() {
        let padded = pad32(&[0x01, 0x02]);
        assert_eq!(padded.len(), 32);
        assert_eq!(&padded[30..], &[0x01, 0x02]);
        assert!(padded[..30].iter().all(|&b| b == 0));
    }
}
