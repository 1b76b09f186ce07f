use blockchain::crypto::address::get_pub_key_hash;
use blockchain::did::document::DidDocument;
use blockchain::domain::wallet::Wallet;
use blockchain::domain::wallets::{KemWallets, Wallets};
use blockchain::node::NodeContext;
use blockchain::service::BlockchainService;

mod test_helpers;
use test_helpers::{collect_blocks_by_height, create_single_block, create_temp_blockchain, verify_blockchain_integrity};

fn unique_file(prefix: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("{prefix}_{}.dat", uuid::Uuid::new_v4()))
}

fn new_test_context() -> (NodeContext, tempfile::TempDir, String) {
    let temp_dir = tempfile::TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join(format!("chain_{}", uuid::Uuid::new_v4()));

    let wallet_file = unique_file("wallets");
    let kem_file = unique_file("kem_wallets");
    let mut wallets = Wallets::new(wallet_file.to_str().unwrap().to_string()).expect("wallets");
    let kem_wallets = KemWallets::new(kem_file.to_str().unwrap().to_string()).expect("kem wallets");
    // The genesis payee must be a wallet this context actually holds, or
    // later address-keyed lookups (submit_transaction, create_did) fail.
    let genesis_address = wallets.create_wallet().expect("create genesis wallet");

    let blockchain =
        BlockchainService::initialize(db_path.to_str().unwrap(), "blocks", &genesis_address).expect("init chain");

    let ctx = NodeContext::new(blockchain, wallets, kem_wallets, "127.0.0.1:9200".parse().unwrap(), None);
    (ctx, temp_dir, genesis_address)
}

#[test]
fn genesis_balance_matches_block_reward() {
    let (blockchain, _temp_dir, genesis_address) = create_temp_blockchain();
    let pub_key_hash = get_pub_key_hash(&genesis_address).unwrap();
    let balance = blockchain.get_balance(&pub_key_hash).unwrap();
    assert_eq!(balance, 20);
}

#[test]
fn spend_with_change_splits_outputs_correctly() {
    let (ctx, _temp_dir, genesis_address) = new_test_context();
    let recipient = ctx.create_wallet().unwrap();

    ctx.submit_transaction(&genesis_address, &recipient, 5, true).unwrap();

    assert_eq!(ctx.get_balance(&recipient).unwrap(), 5);
    // genesis wallet keeps its change (15) plus the fresh block's coinbase (20)
    assert_eq!(ctx.get_balance(&genesis_address).unwrap(), 15 + 20);
}

#[test]
fn blockchain_stays_linked_across_several_blocks() {
    let (blockchain, _temp_dir, genesis_address) = create_temp_blockchain();
    for _ in 0..3 {
        create_single_block(&blockchain, &genesis_address);
    }
    // Genesis is height 0, so three additional blocks land the tip at height 3.
    assert_eq!(blockchain.get_best_height().unwrap(), 3);
    assert!(verify_blockchain_integrity(&blockchain));

    let blocks = collect_blocks_by_height(&blockchain);
    assert_eq!(blocks.len(), 4);
}

#[test]
fn reindexing_utxo_matches_chain_contents() {
    let (blockchain, _temp_dir, genesis_address) = create_temp_blockchain();
    create_single_block(&blockchain, &genesis_address);

    blockchain.reindex_utxo().unwrap();
    let count = blockchain.count_utxo().unwrap();
    assert!(count > 0);
}

#[test]
fn did_create_find_and_challenge_round_trip() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db_path = temp_dir.path().join(format!("chain_{}", uuid::Uuid::new_v4()));
    let wallet = Wallet::new().unwrap();
    let genesis_address = wallet.get_address();
    let blockchain =
        BlockchainService::initialize(db_path.to_str().unwrap(), "blocks", &genesis_address).unwrap();
    let wallet_file = unique_file("wallets");
    let kem_file = unique_file("kem_wallets");
    let mut wallets = Wallets::new(wallet_file.to_str().unwrap().to_string()).unwrap();
    let kem_wallets = KemWallets::new(kem_file.to_str().unwrap().to_string()).unwrap();
    wallets.create_wallet().unwrap();
    let second_address = wallets.create_wallet().unwrap();

    // A miner address is set so the second DID submission crosses the
    // mempool mining threshold and lands both in the same block.
    let ctx = NodeContext::new(
        blockchain,
        wallets,
        kem_wallets,
        "127.0.0.1:9201".parse().unwrap(),
        Some(genesis_address.clone()),
    );

    let did = ctx.create_did(&genesis_address, None).unwrap();
    assert!(did.starts_with("did:easyblock:"));
    ctx.create_did(&second_address, None).unwrap();

    let resolved = ctx.find_did(&did).unwrap();
    assert_eq!(resolved.id, did);

    let challenge = ctx.issue_challenge(&did).unwrap();
    assert!(!challenge.is_empty());
}

#[test]
fn did_document_id_is_derived_from_the_pubkey_not_the_wallet_address() {
    let wallet = Wallet::new().unwrap();
    let document = DidDocument::for_wallet(&wallet);
    assert_eq!(document.id, blockchain::did::did_for_pub_key(wallet.get_public_key()));
    assert_ne!(document.id, format!("did:easyblock:{}", wallet.get_address()));
}

#[test]
fn transaction_serialization_round_trips() {
    let address = Wallet::new().unwrap().get_address();
    let coinbase = test_helpers::create_coinbase_transaction(&address);
    assert!(coinbase.is_coinbase());
    assert_eq!(coinbase.get_outputs().len(), 1);
    assert_eq!(coinbase.get_inputs().len(), 1);

    let bytes = coinbase.serialize().unwrap();
    let decoded = blockchain::domain::transaction::Transaction::deserialize(&bytes).unwrap();
    assert_eq!(coinbase.get_id(), decoded.get_id());
}

#[test]
fn pow_rejection_is_reported_by_print_chain() {
    let (blockchain, _temp_dir, genesis_address) = create_temp_blockchain();
    create_single_block(&blockchain, &genesis_address);

    // every freshly-mined block in this test reports a valid PoW
    for (_, pow_valid) in blockchain.print_chain() {
        assert!(pow_valid);
    }
}
