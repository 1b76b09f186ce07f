//! DID document construction.
//!
//! A document's id is `did:easyblock:<base58(last-20-bytes(sha256(compressed
//! P-256 pubkey)))>` — derived straight from the wallet's own key material,
//! independent of that wallet's `VERSION_ECDSA` address encoding. It carries
//! a `JsonWebKey2020` verification method for the wallet's ECDSA key at
//! `<did>#authentication-key`. A KEM wallet can be layered on top, adding a
//! `KemJsonKey2025` method at `<did>#lattice-key` whose JWK `x` is the raw
//! Kyber-768 encapsulation key, base64url-encoded.
//!
//! Grounded on `domain/wallet.rs`'s `Wallet`/`KemWallet` for the key
//! material and on `domain/transaction.rs`'s `new_did_transaction` for how
//! a document becomes an on-chain payload.

use data_encoding::BASE64URL_NOPAD;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::crypto::address::base58_encode;
use crate::crypto::hash::sha256_digest;
use crate::domain::transaction::Transaction;
use crate::domain::wallet::{KemWallet, Wallet};
use crate::error::Result;

const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const DID_METHOD: &str = "easyblock";
const DID_HASH_LEN: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    pub public_key_jwk: Jwk,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    pub verification_method: Vec<VerificationMethod>,
    pub authentication: Vec<String>,
    pub assertion_method: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<String>>,
}

/// Compresses a raw `x ‖ y` P-256 public key (as `Wallet::get_public_key`
/// hands back) into SEC1 compressed form: a parity prefix byte plus `x`.
fn compress_p256_pub_key(raw_pub_key: &[u8]) -> Vec<u8> {
    let (x, y) = raw_pub_key.split_at(raw_pub_key.len() / 2);
    let prefix = if y[y.len() - 1] & 1 == 0 { 0x02 } else { 0x03 };
    let mut compressed = Vec::with_capacity(1 + x.len());
    compressed.push(prefix);
    compressed.extend_from_slice(x);
    compressed
}

/// `did:easyblock:<base58(last-20-bytes(sha256(compressed_pubkey)))>` — the
/// identifier a wallet's ECDSA key resolves to.
pub fn did_for_pub_key(raw_pub_key: &[u8]) -> String {
    let compressed = compress_p256_pub_key(raw_pub_key);
    let digest = sha256_digest(&compressed);
    let tail = &digest[digest.len() - DID_HASH_LEN..];
    format!("did:{DID_METHOD}:{}", base58_encode(tail))
}

impl DidDocument {
    /// Builds a document for `wallet`'s ECDSA key alone.
    pub fn for_wallet(wallet: &Wallet) -> DidDocument {
        let pub_key = wallet.get_public_key();
        let did = did_for_pub_key(pub_key);
        let (x, y) = pub_key.split_at(pub_key.len() / 2);

        let auth_method = VerificationMethod {
            id: format!("{did}#authentication-key"),
            type_: "JsonWebKey2020".to_string(),
            controller: did.clone(),
            public_key_jwk: Jwk {
                kty: "EC".to_string(),
                crv: "P-256".to_string(),
                x: BASE64URL_NOPAD.encode(x),
                y: Some(BASE64URL_NOPAD.encode(y)),
            },
        };

        DidDocument {
            context: vec![DID_CONTEXT.to_string()],
            id: did,
            authentication: vec![auth_method.id.clone()],
            assertion_method: vec![auth_method.id.clone()],
            verification_method: vec![auth_method],
            key_agreement: None,
        }
    }

    /// Layers a `KemJsonKey2025` lattice key on top of this document.
    pub fn with_kem_wallet(mut self, kem_wallet: &KemWallet) -> DidDocument {
        let kem_method = VerificationMethod {
            id: format!("{}#lattice-key", self.id),
            type_: "KemJsonKey2025".to_string(),
            controller: self.id.clone(),
            public_key_jwk: Jwk {
                kty: "KYBER".to_string(),
                crv: "Kyber768".to_string(),
                x: BASE64URL_NOPAD.encode(kem_wallet.get_encapsulation_key()),
                y: None,
            },
        };
        self.assertion_method.push(kem_method.id.clone());
        self.key_agreement = Some(vec![kem_method.id.clone()]);
        self.verification_method.push(kem_method);
        self
    }

    pub fn authentication_pub_key(&self) -> Option<Vec<u8>> {
        self.verification_method
            .iter()
            .find(|vm| vm.id.ends_with("#authentication-key"))
            .and_then(|vm| {
                let x = BASE64URL_NOPAD.decode(vm.public_key_jwk.x.as_bytes()).ok()?;
                let y = vm
                    .public_key_jwk
                    .y
                    .as_ref()
                    .and_then(|y| BASE64URL_NOPAD.decode(y.as_bytes()).ok())?;
                Some([x, y].concat())
            })
    }

    pub fn lattice_encapsulation_key(&self) -> Option<Vec<u8>> {
        self.verification_method
            .iter()
            .find(|vm| vm.id.ends_with("#lattice-key"))
            .and_then(|vm| BASE64URL_NOPAD.decode(vm.public_key_jwk.x.as_bytes()).ok())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| crate::error::BtcError::DidEncodingError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<DidDocument> {
        serde_json::from_str(json).map_err(|e| crate::error::BtcError::DidDecodingError(e.to_string()))
    }

    /// Wraps this document as a self-attested DID transaction, signed with
    /// `pkcs8` — see `Transaction::new_did_transaction`.
    pub fn into_transaction(self, pkcs8: &[u8]) -> Result<Transaction> {
        Transaction::new_did_transaction(self.to_json()?, pkcs8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_matches_wallet_address() {
        let wallet = Wallet::new().unwrap();
        let doc = DidDocument::for_wallet(&wallet);
        assert_eq!(doc.id, did_for_pub_key(wallet.get_public_key()));
        assert!(doc.id.starts_with("did:easyblock:"));
        assert_eq!(doc.verification_method.len(), 1);
        assert!(doc.key_agreement.is_none());
    }

    #[test]
    fn authentication_pub_key_round_trips() {
        let wallet = Wallet::new().unwrap();
        let doc = DidDocument::for_wallet(&wallet);
        assert_eq!(doc.authentication_pub_key().unwrap(), wallet.get_public_key());
    }

    #[test]
    fn kem_augmentation_adds_lattice_key() {
        let wallet = Wallet::new().unwrap();
        let kem_wallet = KemWallet::new();
        let doc = DidDocument::for_wallet(&wallet).with_kem_wallet(&kem_wallet);

        assert_eq!(doc.verification_method.len(), 2);
        assert_eq!(doc.key_agreement.as_ref().unwrap().len(), 1);
        assert_eq!(doc.assertion_method.len(), 2);
        assert!(doc.assertion_method.contains(&format!("{}#lattice-key", doc.id)));
        assert_eq!(
            doc.lattice_encapsulation_key().unwrap(),
            kem_wallet.get_encapsulation_key()
        );
    }

    #[test]
    fn document_json_round_trips() {
        let wallet = Wallet::new().unwrap();
        let doc = DidDocument::for_wallet(&wallet);
        let json = doc.to_json().unwrap();
        let decoded = DidDocument::from_json(&json).unwrap();
        assert_eq!(decoded.id, doc.id);
    }

    #[test]
    fn document_becomes_a_self_attested_transaction() {
        let wallet = Wallet::new().unwrap();
        let doc = DidDocument::for_wallet(&wallet);
        let tx = doc.into_transaction(wallet.get_pkcs8()).unwrap();
        assert!(tx.is_did_transaction());
    }
}
