use std::net::SocketAddr;
use std::sync::Arc;

use blockchain::domain::wallet::validate_address;
use blockchain::domain::wallets::{KemWallets, Wallets};
use blockchain::error::{BtcError, Result};
use blockchain::network::gossip::{self, Dispatcher};
use blockchain::node::NodeContext;
use blockchain::service::BlockchainService;
use blockchain::web::server::{WebServerConfig, create_web_server_with_config};
use blockchain::{BOOTSTRAP_PEER, GLOBAL_CONFIG};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt,
    prelude::*,
};

#[derive(Debug, Parser)]
#[command(name = "blockchain", about = "A UTXO blockchain node with a DID overlay")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "createblockchain", about = "Create the blockchain and send the genesis reward to an address")]
    CreateBlockchain {
        #[arg(long = "address")]
        address: String,
    },
    #[command(name = "createwallet", about = "Create a new ECDSA wallet in this node's wallet file")]
    CreateWallet,
    #[command(name = "createkemwallet", about = "Create a new KEM wallet in the process-global KEM wallet file")]
    CreateKemWallet,
    #[command(name = "listaddresses", about = "List the ECDSA addresses of this node's wallets")]
    ListAddresses,
    #[command(name = "printchain", about = "Walk the chain tip to genesis, printing each block and its PoW validity")]
    PrintChain,
    #[command(name = "reindexutxo", about = "Rebuild the UTXO index from the chain")]
    ReindexUtxo,
    #[command(name = "getbalance", about = "Get the balance of an address")]
    GetBalance {
        #[arg(long = "address")]
        address: String,
    },
    #[command(name = "send", about = "Send coins between addresses")]
    Send {
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        #[arg(long = "amount")]
        amount: i64,
        #[arg(long = "mine", default_value_t = false)]
        mine: bool,
    },
    #[command(name = "startnode", about = "Start the gossip listener and, on the DID service node, the DID HTTP service")]
    StartNode {
        #[arg(long = "miner")]
        miner: Option<String>,
    },
}

fn initialize_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .init();
}

fn open_blockchain() -> Result<BlockchainService> {
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    BlockchainService::open(&config.blocks_dir(), &config.blocks_tree_name())
}

fn create_blockchain(address: &str) -> Result<()> {
    validate_address(address)?;
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let blockchain = BlockchainService::initialize(&config.blocks_dir(), &config.blocks_tree_name(), address)?;
    blockchain.reindex_utxo()?;
    info!("Blockchain created, genesis block mined paying {}", address);
    Ok(())
}

fn create_wallet() -> Result<()> {
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let mut wallets = Wallets::new(config.wallet_file())?;
    let address = wallets.create_wallet()?;
    info!("Your new address: {}", address);
    Ok(())
}

fn create_kem_wallet() -> Result<()> {
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let mut wallets = KemWallets::new(config.kem_wallet_file())?;
    let address = wallets.create_wallet()?;
    info!("Your new KEM address: {}", address);
    Ok(())
}

fn list_addresses() -> Result<()> {
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let wallets = Wallets::new(config.wallet_file())?;
    wallets.get_addresses().iter().for_each(|address| info!("{address}"));
    Ok(())
}

fn print_chain() -> Result<()> {
    let blockchain = open_blockchain()?;
    for (block, pow_valid) in blockchain.print_chain() {
        info!("Pre block hash: {}", block.get_pre_block_hash());
        info!("Cur block hash: {}", block.get_hash());
        info!("Cur block Timestamp: {}", block.get_timestamp());
        info!("PoW: {}", pow_valid);
    }
    Ok(())
}

fn reindex_utxo() -> Result<()> {
    let blockchain = open_blockchain()?;
    blockchain.reindex_utxo()?;
    let count = blockchain.count_utxo()?;
    info!("Done! There are {count} transactions in the UTXO set.");
    Ok(())
}

fn get_balance(address: &str) -> Result<()> {
    validate_address(address)?;
    let blockchain = open_blockchain()?;
    let pub_key_hash = blockchain::crypto::address::get_pub_key_hash(address)?;
    let balance = blockchain.get_balance(&pub_key_hash)?;
    info!("Balance of {address}: {balance}");
    Ok(())
}

fn send(from: &str, to: &str, amount: i64, mine: bool) -> Result<()> {
    validate_address(from)?;
    validate_address(to)?;
    if amount <= 0 {
        return Err(BtcError::NotEnoughFunds);
    }

    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let blockchain = open_blockchain()?;
    let wallets = Wallets::new(config.wallet_file())?;
    let self_addr = config.node_addr();
    drop(config);

    let sender = wallets
        .get_wallet(from)
        .cloned()
        .ok_or_else(|| BtcError::InvalidAddress(from.to_string()))?;
    let tx = blockchain.build_utxo_transaction(&sender, to, amount)?;

    if mine {
        blockchain.mine_block(&[tx], from)?;
        blockchain.reindex_utxo()?;
        info!("Mined transaction sending {amount} from {from} to {to}");
    } else {
        let peers = blockchain::network::peers::Nodes::new();
        peers.add_node(*BOOTSTRAP_PEER)?;
        gossip::send_tx(&peers, self_addr, *BOOTSTRAP_PEER, &tx)?;
        info!("Relayed transaction sending {amount} from {from} to {to} to {}", *BOOTSTRAP_PEER);
    }
    Ok(())
}

async fn start_node(miner: Option<String>) -> Result<()> {
    let config = GLOBAL_CONFIG.read().expect("config lock poisoned");
    let self_addr: SocketAddr = config.node_addr();
    let starts_did_service = config.starts_did_service();
    let blocks_dir = config.blocks_dir();
    let blocks_tree = config.blocks_tree_name();
    let wallet_file = config.wallet_file();
    let kem_wallet_file = config.kem_wallet_file();
    let miner_address = miner.or_else(|| config.mining_address().map(str::to_string));
    drop(config);

    if let Some(address) = &miner_address {
        validate_address(address)?;
    }

    let blockchain = BlockchainService::open(&blocks_dir, &blocks_tree)?;
    let wallets = Wallets::new(wallet_file)?;
    let kem_wallets = KemWallets::new(kem_wallet_file)?;

    let ctx = Arc::new(NodeContext::new(blockchain, wallets, kem_wallets, self_addr, miner_address));

    if self_addr != *BOOTSTRAP_PEER {
        if let Err(e) = ctx.bootstrap(*BOOTSTRAP_PEER) {
            error!("bootstrap handshake with {} failed: {}", *BOOTSTRAP_PEER, e);
        }
    }

    let dispatcher: Arc<Dispatcher> = Arc::new(ctx.dispatcher()?);
    let listener_dispatcher = dispatcher.clone();
    std::thread::spawn(move || {
        if let Err(e) = gossip::listen(listener_dispatcher) {
            error!("gossip listener stopped: {}", e);
        }
    });

    if starts_did_service {
        info!("{} is the DID service node, starting the HTTP service", self_addr);
        let node_context = match Arc::try_unwrap(ctx) {
            Ok(node_context) => node_context,
            Err(_) => return Err(BtcError::InvariantViolation("NodeContext still shared at startup".to_string())),
        };
        let server = create_web_server_with_config(node_context, WebServerConfig::default());
        server
            .start_with_shutdown()
            .await
            .map_err(|e| BtcError::InvariantViolation(e.to_string()))?;
    } else {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| BtcError::InvariantViolation(e.to_string()))?;
        info!("shutdown signal received");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    initialize_logging();
    let opt = Opt::parse();

    let result = match opt.command {
        Command::CreateBlockchain { address } => create_blockchain(&address),
        Command::CreateWallet => create_wallet(),
        Command::CreateKemWallet => create_kem_wallet(),
        Command::ListAddresses => list_addresses(),
        Command::PrintChain => print_chain(),
        Command::ReindexUtxo => reindex_utxo(),
        Command::GetBalance { address } => get_balance(&address),
        Command::Send { from, to, amount, mine } => send(&from, &to, amount, mine),
        Command::StartNode { miner } => start_node(miner).await,
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
