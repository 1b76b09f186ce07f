//! DID resolution.
//!
//! There is no separate DID index — a document is just a transaction
//! payload like any other, so resolving a DID means walking the chain
//! (`BlockchainService::all_transactions`, already tip-first) and taking
//! the first DID document whose `id` matches.

use crate::did::document::DidDocument;
use crate::error::{BtcError, Result};
use crate::service::BlockchainService;

/// Finds the most recently published document for `did`. Blocks come back
/// tip-first, so the first match is also the most recent.
pub fn resolve(blockchain: &BlockchainService, did: &str) -> Result<DidDocument> {
    blockchain
        .all_transactions()
        .into_iter()
        .filter(|tx| tx.is_did_transaction())
        .find_map(|tx| {
            let json = tx.get_payload().first()?;
            let doc = DidDocument::from_json(json).ok()?;
            (doc.id == did).then_some(doc)
        })
        .ok_or_else(|| BtcError::DidNotFoundError(did.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wallet::Wallet;

    fn temp_dir(prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4())
    }

    #[test]
    fn resolve_finds_a_published_document() {
        let dir = temp_dir("test_did_resolve");
        let wallet = Wallet::new().unwrap();
        let blockchain = BlockchainService::initialize(&dir, "blocks", &wallet.get_address()).unwrap();

        let doc = DidDocument::for_wallet(&wallet);
        let did = doc.id.clone();
        let tx = doc.into_transaction(wallet.get_pkcs8()).unwrap();
        blockchain.mine_block(&[tx], &wallet.get_address()).unwrap();

        let resolved = resolve(&blockchain, &did).unwrap();
        assert_eq!(resolved.id, did);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolve_fails_for_unknown_did() {
        let dir = temp_dir("test_did_resolve_missing");
        let wallet = Wallet::new().unwrap();
        let blockchain = BlockchainService::initialize(&dir, "blocks", &wallet.get_address()).unwrap();

        assert!(resolve(&blockchain, "did:btc:nonexistent").is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
