//! Transactions.
//!
//! The transaction id is a SHA-256 fingerprint of the transaction's canonical
//! JSON form with `id`, `payload` and `timestamp` forced to their zero value.
//! Every node must clear those three fields identically before hashing or
//! cross-node signature verification breaks; see `compute_id`.

use data_encoding::{BASE64, HEXLOWER};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::ecdsa;
use crate::crypto::hash::{current_timestamp_millis, sha256_digest};
use crate::error::{BtcError, Result};

/// Fixed block reward; this chain does not halve.
pub const SUBSIDY: i64 = 20;

/// Sentinel `vout` marking a coinbase input's absent previous output.
pub const COINBASE_VOUT: i64 = -1;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TXInput {
    txid: Vec<u8>,
    vout: i64,
    signature: Vec<u8>,
    pub_key: Vec<u8>,
}

impl TXInput {
    pub fn new(txid: &[u8], vout: i64) -> TXInput {
        TXInput {
            txid: txid.to_vec(),
            vout,
            signature: vec![],
            pub_key: vec![],
        }
    }

    pub fn get_txid(&self) -> &[u8] {
        &self.txid
    }

    pub fn get_vout(&self) -> i64 {
        self.vout
    }

    pub fn get_pub_key(&self) -> &[u8] {
        &self.pub_key
    }

    pub fn get_signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn uses_key(&self, pub_key_hash: &[u8]) -> bool {
        crate::crypto::hash::hash_pub_key(&self.pub_key) == pub_key_hash
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TXOutput {
    value: i64,
    pub_key_hash: Vec<u8>,
    /// Local annotation used by the UTXO index to flag an output already
    /// claimed by a pending mempool transaction. Process-memory only: never
    /// part of the canonical hash, and reset to `false` on every reload.
    #[serde(skip)]
    in_global_mem_pool: bool,
}

impl TXOutput {
    pub fn new(value: i64, address: &str) -> Result<TXOutput> {
        let pub_key_hash = crate::crypto::address::get_pub_key_hash(address)?;
        Ok(TXOutput {
            value,
            pub_key_hash,
            in_global_mem_pool: false,
        })
    }

    pub fn from_pub_key_hash(value: i64, pub_key_hash: Vec<u8>) -> TXOutput {
        TXOutput {
            value,
            pub_key_hash,
            in_global_mem_pool: false,
        }
    }

    pub fn get_value(&self) -> i64 {
        self.value
    }

    pub fn get_pub_key_hash(&self) -> &[u8] {
        &self.pub_key_hash
    }

    pub fn is_locked_with_key(&self, pub_key_hash: &[u8]) -> bool {
        self.pub_key_hash == pub_key_hash
    }

    pub fn set_in_global_mem_pool(&mut self, value: bool) {
        self.in_global_mem_pool = value;
    }

    pub fn is_in_global_mem_pool(&self) -> bool {
        self.in_global_mem_pool
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    id: Vec<u8>,
    inputs: Vec<TXInput>,
    outputs: Vec<TXOutput>,
    timestamp: i64,
    payload: Vec<String>,
}

/// Shape actually hashed for the transaction id: `inputs` and `outputs` carry
/// through unchanged, `id`, `payload` and `timestamp` are always zeroed.
#[derive(Serialize)]
struct CanonicalForm<'a> {
    id: &'a [u8],
    inputs: &'a [TXInput],
    outputs: &'a [TXOutput],
    timestamp: i64,
    payload: &'a [String],
}

impl Transaction {
    /// Builds a coinbase transaction paying `SUBSIDY` to `to`. The single
    /// input carries a random tag instead of a signature, so `is_coinbase`
    /// can recognize it by its empty `txid`/`vout` sentinel rather than by
    /// the tag's contents.
    pub fn new_coinbase_tx(to: &str) -> Result<Transaction> {
        let txout = TXOutput::new(SUBSIDY, to)?;
        let tx_input = TXInput {
            txid: vec![],
            vout: COINBASE_VOUT,
            signature: Uuid::new_v4().as_bytes().to_vec(),
            pub_key: vec![],
        };
        let mut tx = Transaction {
            id: vec![],
            inputs: vec![tx_input],
            outputs: vec![txout],
            timestamp: current_timestamp_millis(),
            payload: vec![],
        };
        tx.id = tx.compute_id();
        Ok(tx)
    }

    /// Builds a spending transaction from already-selected inputs/outputs,
    /// assigns its id, and signs it via `find_prev_output` (one lookup per
    /// input, resolving `(prev_txid, prev_vout)` to the output it spends).
    pub fn new_utxo_transaction(
        inputs: Vec<TXInput>,
        outputs: Vec<TXOutput>,
        pkcs8: &[u8],
        find_prev_output: impl Fn(&[u8], i64) -> Result<TXOutput>,
    ) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            inputs,
            outputs,
            timestamp: current_timestamp_millis(),
            payload: vec![],
        };
        tx.id = tx.compute_id();
        tx.sign(pkcs8, find_prev_output)?;
        Ok(tx)
    }

    /// Embeds a DID document as `payload[0]`, self-attesting it with a
    /// signature (`payload[1]`, base64) over the transaction's id computed
    /// before that signature is appended.
    pub fn new_did_transaction(document_json: String, pkcs8: &[u8]) -> Result<Transaction> {
        let mut tx = Transaction {
            id: vec![],
            inputs: vec![],
            outputs: vec![],
            timestamp: current_timestamp_millis(),
            payload: vec![document_json],
        };
        tx.id = tx.compute_id();
        let attestation = ecdsa::sign_digest(pkcs8, &tx.id)?;
        tx.payload.push(BASE64.encode(&attestation));
        Ok(tx)
    }

    fn trimmed_copy(&self) -> Transaction {
        let inputs = self
            .inputs
            .iter()
            .map(|input| TXInput::new(input.get_txid(), input.get_vout()))
            .collect();
        Transaction {
            id: self.id.clone(),
            inputs,
            outputs: self.outputs.clone(),
            timestamp: self.timestamp,
            payload: self.payload.clone(),
        }
    }

    fn sign(
        &mut self,
        pkcs8: &[u8],
        find_prev_output: impl Fn(&[u8], i64) -> Result<TXOutput>,
    ) -> Result<()> {
        let mut tx_copy = self.trimmed_copy();

        for idx in 0..self.inputs.len() {
            let vin = &self.inputs[idx];
            let prev_output = find_prev_output(vin.get_txid(), vin.get_vout())?;

            tx_copy.inputs[idx].pub_key = prev_output.get_pub_key_hash().to_vec();
            let digest = tx_copy.compute_id();
            tx_copy.inputs[idx].pub_key = vec![];

            let signature = ecdsa::sign_digest(pkcs8, &digest)?;
            self.inputs[idx].signature = signature;
        }
        Ok(())
    }

    /// Coinbase transactions always verify. Otherwise every input's
    /// signature is checked against the pubkey hash locked into the output
    /// it spends, rebuilding the same trimmed digest `sign` produced.
    pub fn verify(&self, find_prev_output: impl Fn(&[u8], i64) -> Result<TXOutput>) -> Result<bool> {
        if self.is_coinbase() {
            return Ok(true);
        }

        let mut tx_copy = self.trimmed_copy();
        for (idx, vin) in self.inputs.iter().enumerate() {
            if vin.get_signature().len() != ecdsa::SIGNATURE_LEN
                || vin.get_pub_key().len() != ecdsa::PUBLIC_KEY_LEN
            {
                return Ok(false);
            }
            let prev_output = find_prev_output(vin.get_txid(), vin.get_vout())?;

            tx_copy.inputs[idx].pub_key = prev_output.get_pub_key_hash().to_vec();
            let digest = tx_copy.compute_id();
            tx_copy.inputs[idx].pub_key = vec![];

            if !ecdsa::verify(vin.get_pub_key(), vin.get_signature(), &digest)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].txid.is_empty()
            && self.inputs[0].vout == COINBASE_VOUT
    }

    /// SHA-256 of the canonical JSON form with `id`, `payload` and
    /// `timestamp` zeroed, per the id-computation rule every node must share.
    fn compute_id(&self) -> Vec<u8> {
        let canonical = CanonicalForm {
            id: &[],
            inputs: &self.inputs,
            outputs: &self.outputs,
            timestamp: 0,
            payload: &[],
        };
        let json = serde_json::to_vec(&canonical).expect("canonical transaction form is always serializable");
        sha256_digest(&json)
    }

    pub fn get_id(&self) -> &[u8] {
        &self.id
    }

    pub fn get_id_hex(&self) -> String {
        HEXLOWER.encode(&self.id)
    }

    pub fn get_inputs(&self) -> &[TXInput] {
        &self.inputs
    }

    pub fn get_outputs(&self) -> &[TXOutput] {
        &self.outputs
    }

    pub fn get_outputs_mut(&mut self) -> &mut [TXOutput] {
        &mut self.outputs
    }

    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_payload(&self) -> &[String] {
        &self.payload
    }

    /// `true` for DID-document transactions: no inputs, no outputs, at
    /// least one payload entry.
    pub fn is_did_transaction(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty() && !self.payload.is_empty()
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| BtcError::TransactionSerializationError(e.to_string()))
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Transaction> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(tx, _)| tx)
            .map_err(|e| BtcError::TransactionDeserializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wallet::Wallet;

    fn test_address() -> String {
        Wallet::new().expect("wallet").get_address()
    }

    #[test]
    fn coinbase_transaction_has_one_input_and_fixed_reward() {
        let address = test_address();
        let tx = Transaction::new_coinbase_tx(&address).unwrap();

        assert!(tx.is_coinbase());
        assert_eq!(tx.get_inputs().len(), 1);
        assert_eq!(tx.get_outputs().len(), 1);
        assert_eq!(tx.get_outputs()[0].get_value(), SUBSIDY);
        assert_eq!(tx.get_inputs()[0].get_vout(), COINBASE_VOUT);
    }

    #[test]
    fn coinbase_verifies_without_lookup() {
        let address = test_address();
        let tx = Transaction::new_coinbase_tx(&address).unwrap();
        let verified = tx
            .verify(|_txid, _vout| Err(BtcError::TransactionNotFoundError("unreachable".into())))
            .unwrap();
        assert!(verified);
    }

    #[test]
    fn serialize_round_trips_id() {
        let address = test_address();
        let tx = Transaction::new_coinbase_tx(&address).unwrap();
        let bytes = tx.serialize().unwrap();
        let decoded = Transaction::deserialize(&bytes).unwrap();
        assert_eq!(tx.get_id(), decoded.get_id());
    }

    #[test]
    fn spend_transaction_signs_and_verifies() {
        let sender = Wallet::new().unwrap();
        let recipient_address = test_address();
        let prev_output = TXOutput::new(SUBSIDY, &sender.get_address()).unwrap();

        let input = TXInput {
            txid: vec![1; 32],
            vout: 0,
            signature: vec![],
            pub_key: sender.get_public_key().to_vec(),
        };
        let output = TXOutput::new(SUBSIDY, &recipient_address).unwrap();

        let tx = Transaction::new_utxo_transaction(
            vec![input],
            vec![output],
            sender.get_pkcs8(),
            |_txid, _vout| Ok(prev_output.clone()),
        )
        .unwrap();

        assert!(!tx.is_coinbase());
        let verified = tx.verify(|_txid, _vout| Ok(prev_output.clone())).unwrap();
        assert!(verified);
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let sender = Wallet::new().unwrap();
        let recipient_address = test_address();
        let prev_output = TXOutput::new(SUBSIDY, &sender.get_address()).unwrap();

        let input = TXInput {
            txid: vec![2; 32],
            vout: 0,
            signature: vec![],
            pub_key: sender.get_public_key().to_vec(),
        };
        let output = TXOutput::new(SUBSIDY, &recipient_address).unwrap();

        let mut tx = Transaction::new_utxo_transaction(
            vec![input],
            vec![output],
            sender.get_pkcs8(),
            |_txid, _vout| Ok(prev_output.clone()),
        )
        .unwrap();
        tx.inputs[0].signature[0] ^= 0xff;

        let verified = tx.verify(|_txid, _vout| Ok(prev_output.clone())).unwrap();
        assert!(!verified);
    }

    #[test]
    fn did_transaction_has_document_and_attestation_payload() {
        let wallet = Wallet::new().unwrap();
        let tx = Transaction::new_did_transaction("{\"id\":\"did:easyblock:abc\"}".to_string(), wallet.get_pkcs8())
            .unwrap();

        assert!(tx.is_did_transaction());
        assert_eq!(tx.get_payload().len(), 2);
        assert!(BASE64.decode(tx.get_payload()[1].as_bytes()).is_ok());
    }
}
