//! Challenge/response authentication for a resolved DID.
//!
//! A verifier asks for a challenge, gets back a random nonce bound to the
//! DID's authentication key, and proves control of the private key by
//! signing that nonce. Challenges live only in process memory — there is
//! no need to persist a one-time nonce — and expire after five minutes;
//! expired or already-consumed entries are swept lazily on the next
//! `issue`/`verify` call rather than on a timer.

use std::collections::HashMap;
use std::sync::Mutex;

use data_encoding::HEXLOWER;
use ring::rand::{SecureRandom, SystemRandom};

use crate::crypto::ecdsa;
use crate::crypto::hash::current_timestamp_millis;
use crate::error::{BtcError, Result};

const CHALLENGE_TTL_MILLIS: i64 = 5 * 60 * 1000;
const NONCE_LEN: usize = 32;

struct ChallengeEntry {
    nonce: String,
    pub_key: Vec<u8>,
    expires_at: i64,
}

pub struct ChallengeStore {
    inner: Mutex<HashMap<String, ChallengeEntry>>,
}

impl ChallengeStore {
    pub fn new() -> ChallengeStore {
        ChallengeStore {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh challenge for `did`, bound to the authentication
    /// `pub_key` resolved from its document. Replaces any challenge
    /// already pending for the same DID.
    pub fn issue(&self, did: &str, pub_key: Vec<u8>) -> Result<String> {
        let mut bytes = [0u8; NONCE_LEN];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|e| BtcError::InvariantViolation(e.to_string()))?;
        let nonce = HEXLOWER.encode(&bytes);

        let mut inner = self
            .inner
            .lock()
            .map_err(|e| BtcError::InvariantViolation(e.to_string()))?;
        sweep(&mut inner);
        inner.insert(
            did.to_string(),
            ChallengeEntry {
                nonce: nonce.clone(),
                pub_key,
                expires_at: current_timestamp_millis() + CHALLENGE_TTL_MILLIS,
            },
        );
        Ok(nonce)
    }

    /// Verifies `signature` over the pending challenge for `did`. The
    /// challenge is consumed either way — it is single-use.
    pub fn verify(&self, did: &str, signature: &[u8]) -> Result<bool> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|e| BtcError::InvariantViolation(e.to_string()))?;
        sweep(&mut inner);
        let entry = inner
            .remove(did)
            .ok_or_else(|| BtcError::ChallengeExpiredError(did.to_string()))?;
        ecdsa::verify(&entry.pub_key, signature, entry.nonce.as_bytes())
    }
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep(inner: &mut HashMap<String, ChallengeEntry>) {
    let now = current_timestamp_millis();
    inner.retain(|_, entry| entry.expires_at > now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::ecdsa as ecdsa_crypto;

    #[test]
    fn issued_challenge_verifies_against_the_right_signature() {
        let (pkcs8, pub_key) = ecdsa_crypto::generate_keypair().unwrap();
        let store = ChallengeStore::new();
        let nonce = store.issue("did:btc:abc", pub_key).unwrap();

        let signature = ecdsa_crypto::sign_digest(&pkcs8, nonce.as_bytes()).unwrap();
        assert!(store.verify("did:btc:abc", &signature).unwrap());
    }

    #[test]
    fn challenge_is_single_use() {
        let (pkcs8, pub_key) = ecdsa_crypto::generate_keypair().unwrap();
        let store = ChallengeStore::new();
        let nonce = store.issue("did:btc:abc", pub_key).unwrap();
        let signature = ecdsa_crypto::sign_digest(&pkcs8, nonce.as_bytes()).unwrap();

        assert!(store.verify("did:btc:abc", &signature).unwrap());
        assert!(store.verify("did:btc:abc", &signature).is_err());
    }

    #[test]
    fn unknown_did_fails_verification() {
        let store = ChallengeStore::new();
        assert!(store.verify("did:btc:never-issued", &[0u8; 64]).is_err());
    }
}
