use blockchain::domain::transaction::Transaction;
use blockchain::domain::wallet::Wallet;
use blockchain::domain::wallets::Wallets;
use blockchain::service::BlockchainService;
use tempfile::TempDir;

/// Generate a fresh ECDSA wallet address for use as a test genesis payee.
pub fn generate_test_genesis_address() -> String {
    Wallet::new().expect("failed to create test wallet").get_address()
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4())
}

/// Open a fresh, already-initialized blockchain in a temp directory.
pub fn create_temp_blockchain() -> (BlockchainService, TempDir, String) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let db_path = temp_dir.path().join(unique_name("chain")).to_string_lossy().to_string();
    let genesis_address = generate_test_genesis_address();
    let blockchain =
        BlockchainService::initialize(&db_path, "blocks", &genesis_address).expect("failed to init test blockchain");
    (blockchain, temp_dir, genesis_address)
}

/// Mine and append a block carrying a single coinbase transaction.
pub fn create_single_block(blockchain: &BlockchainService, address: &str) -> blockchain::core::block::Block {
    blockchain.mine_block(&[], address).expect("failed to mine block")
}

/// Open a fresh wallet collection backed by a temp file.
pub fn create_test_wallets() -> (Wallets, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let wallet_file = temp_dir.path().join(unique_name("wallet")).to_string_lossy().to_string();
    (Wallets::new(wallet_file).expect("failed to create test wallets"), temp_dir)
}

/// Build `n` fresh wallet addresses.
pub fn create_test_addresses(count: usize) -> Vec<String> {
    let (mut wallets, _temp_dir) = create_test_wallets();
    (0..count).map(|_| wallets.create_wallet().expect("failed to create wallet")).collect()
}

/// Collect the chain tip-to-genesis into height order.
pub fn collect_blocks_by_height(blockchain: &BlockchainService) -> Vec<blockchain::core::block::Block> {
    let mut blocks: Vec<_> = blockchain.print_chain().into_iter().map(|(block, _)| block).collect();
    blocks.sort_by_key(|b| b.get_height());
    blocks
}

pub fn verify_blockchain_integrity(blockchain: &BlockchainService) -> bool {
    let blocks = collect_blocks_by_height(blockchain);
    blocks.iter().enumerate().all(|(i, block)| {
        // Genesis sits at height 0, so index and height line up directly.
        let expected_height = i;
        let prev_ok = if i > 0 {
            block.get_pre_block_hash() == blocks[i - 1].get_hash()
        } else {
            true
        };
        block.get_height() == expected_height && prev_ok
    })
}

pub fn create_coinbase_transaction(address: &str) -> Transaction {
    Transaction::new_coinbase_tx(address).expect("failed to create coinbase transaction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_temp_blockchain_starts_at_genesis_height() {
        let (blockchain, temp_dir, _genesis) = create_temp_blockchain();
        assert!(temp_dir.path().exists());
        assert_eq!(blockchain.get_best_height().unwrap(), 0);
    }

    #[test]
    fn mining_advances_height_and_stays_linked() {
        let (blockchain, _temp_dir, genesis_address) = create_temp_blockchain();
        for _ in 0..3 {
            create_single_block(&blockchain, &genesis_address);
        }
        assert_eq!(blockchain.get_best_height().unwrap(), 3);
        assert!(verify_blockchain_integrity(&blockchain));
    }

    #[test]
    fn create_test_addresses_are_unique_and_nonempty() {
        let addresses = create_test_addresses(3);
        assert_eq!(addresses.len(), 3);
        assert!(addresses.iter().all(|a| !a.is_empty()));
        let unique: std::collections::HashSet<_> = addresses.iter().collect();
        assert_eq!(unique.len(), 3);
    }
}
