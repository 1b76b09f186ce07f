//! Peer gossip: handshake, block sync, transaction relay, and the
//! mining trigger.
//!
//! Mirrors the shape of the teacher's `network/operations.rs` (one
//! `send_*` helper per message variant, each opening a fresh connection)
//! and `network/message_handler.rs` (one dispatch function per inbound
//! variant), re-pointed at the `wire` framing and the synchronous
//! `BlockchainService`/`MemoryPool`/`Nodes` types instead of the teacher's
//! `GLOBAL_*` statics and `crate::chain` types.

use std::io::Write as _;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use data_encoding::HEXLOWER;
use tracing::{error, info, warn};

use crate::core::block::Block;
use crate::core::memory_pool::{BlockInTransit, MemoryPool};
use crate::domain::transaction::Transaction;
use crate::error::{BtcError, Result};
use crate::network::peers::Nodes;
use crate::network::wire::{
    AddrBody, BlockBody, GetBlocksBody, GetDataBody, InvBody, Message, OpType, TxBody, VersionBody,
};
use crate::service::BlockchainService;

pub const NODE_VERSION: usize = 1;
const TCP_WRITE_TIMEOUT_MS: u64 = 1000;
/// Mempool size at which a mining node stops waiting for more transactions
/// and mines a block — matches the teacher's own `TRANSACTION_THRESHOLD`
/// (`src/server.rs`), not the drifted local copy in its `node/miner.rs`.
pub const MINING_THRESHOLD: usize = 2;

fn send(peers: &Nodes, addr_to: SocketAddr, message: &Message) {
    match TcpStream::connect(addr_to) {
        Ok(mut stream) => {
            let _ = stream.set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT_MS)));
            if let Err(e) = message.write_to(&mut stream) {
                error!("failed writing {} to {}: {}", message.command(), addr_to, e);
            }
            let _ = stream.flush();
        }
        Err(_) => {
            warn!("peer {} unreachable, evicting", addr_to);
            let _ = peers.evict_node(&addr_to);
        }
    }
}

pub fn send_version(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, best_height: usize) {
    send(
        peers,
        addr_to,
        &Message::Version(VersionBody {
            addr_from: self_addr,
            version: NODE_VERSION,
            best_height,
        }),
    );
}

pub fn send_get_blocks(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr) {
    send(peers, addr_to, &Message::GetBlocks(GetBlocksBody { addr_from: self_addr }));
}

pub fn send_get_data(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, op_type: OpType, id: Vec<u8>) {
    send(
        peers,
        addr_to,
        &Message::GetData(GetDataBody { addr_from: self_addr, op_type, id }),
    );
}

pub fn send_inv(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, op_type: OpType, items: Vec<Vec<u8>>) {
    send(
        peers,
        addr_to,
        &Message::Inv(InvBody { addr_from: self_addr, op_type, items }),
    );
}

pub fn send_block(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, block: &Block) -> Result<()> {
    let bytes = block.serialize()?;
    send(peers, addr_to, &Message::Block(BlockBody { addr_from: self_addr, block: bytes }));
    Ok(())
}

pub fn send_tx(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, tx: &Transaction) -> Result<()> {
    let bytes = tx.serialize()?;
    send(peers, addr_to, &Message::Tx(TxBody { addr_from: self_addr, transaction: bytes }));
    Ok(())
}

pub fn send_addr(peers: &Nodes, self_addr: SocketAddr, addr_to: SocketAddr, addresses: Vec<SocketAddr>) {
    send(peers, addr_to, &Message::Addr(AddrBody { addr_from: self_addr, addresses }));
}

/// Dials every known peer on startup and announces this node's height —
/// each peer replies with either `getblocks` (we're ahead) or its own
/// `version` (we're behind or even).
pub fn handshake(peers: &Nodes, self_addr: SocketAddr, blockchain: &BlockchainService) -> Result<()> {
    let height = blockchain.get_best_height()?;
    for peer in peers.get_nodes()? {
        if peer != self_addr {
            send_version(peers, self_addr, peer, height);
        }
    }
    Ok(())
}

/// Shared state one dispatcher handles connections against. Cheap to
/// clone — every field is itself `Clone`/`Arc`-backed — so each accepted
/// connection gets its own handle.
#[derive(Clone)]
pub struct Dispatcher {
    pub blockchain: BlockchainService,
    pub peers: Arc<Nodes>,
    pub mempool: Arc<MemoryPool>,
    pub in_transit: Arc<BlockInTransit>,
    pub self_addr: SocketAddr,
    pub miner_address: Option<String>,
}

impl Dispatcher {
    /// Handles exactly one message read off `stream`, per the wire
    /// framing's one-message-per-connection contract. A malformed frame
    /// aborts this connection only; the listener keeps accepting.
    pub fn handle(&self, stream: TcpStream) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(e) => {
                error!("could not read peer address: {}", e);
                return;
            }
        };
        let message = match Message::read_from(&stream) {
            Ok(message) => message,
            Err(e) => {
                warn!("malformed frame from {}: {}", peer_addr, e);
                let _ = stream.shutdown(Shutdown::Both);
                return;
            }
        };
        info!("received {} from {}", message.command(), peer_addr);
        if let Err(e) = self.dispatch(message) {
            error!("error handling message from {}: {}", peer_addr, e);
        }
        let _ = stream.shutdown(Shutdown::Both);
    }

    fn dispatch(&self, message: Message) -> Result<()> {
        match message {
            Message::Version(body) => self.on_version(body),
            Message::Addr(body) => self.on_addr(body),
            Message::Inv(body) => self.on_inv(body),
            Message::GetBlocks(body) => self.on_get_blocks(body),
            Message::GetData(body) => self.on_get_data(body),
            Message::Block(body) => self.on_block(body),
            Message::Tx(body) => self.on_tx(body),
        }
    }

    fn on_version(&self, body: VersionBody) -> Result<()> {
        let local_height = self.blockchain.get_best_height()?;
        if local_height < body.best_height {
            send_get_blocks(&self.peers, self.self_addr, body.addr_from);
        } else if local_height > body.best_height {
            send_version(&self.peers, self.self_addr, body.addr_from, local_height);
        }
        if !self.peers.node_is_known(&body.addr_from)? {
            self.peers.add_node(body.addr_from)?;
        }
        Ok(())
    }

    fn on_addr(&self, body: AddrBody) -> Result<()> {
        let mut new_peers = vec![];
        for addr in body.addresses {
            if !self.peers.node_is_known(&addr)? {
                new_peers.push(addr);
            }
        }
        self.peers.add_nodes(new_peers.iter().copied())?;
        self.peers.add_node(body.addr_from)?;

        let height = self.blockchain.get_best_height()?;
        for peer in new_peers {
            send_version(&self.peers, self.self_addr, peer, height);
        }
        Ok(())
    }

    fn on_get_blocks(&self, body: GetBlocksBody) -> Result<()> {
        let hashes = self.blockchain.get_block_hashes();
        send_inv(&self.peers, self.self_addr, body.addr_from, OpType::Block, hashes);
        Ok(())
    }

    fn on_get_data(&self, body: GetDataBody) -> Result<()> {
        match body.op_type {
            OpType::Block => {
                if let Some(block) = self.blockchain.get_block(&body.id)? {
                    send_block(&self.peers, self.self_addr, body.addr_from, &block)?;
                }
            }
            OpType::Tx => {
                let txid_hex = HEXLOWER.encode(&body.id);
                if let Some(tx) = self.mempool.get(&txid_hex)? {
                    send_tx(&self.peers, self.self_addr, body.addr_from, &tx)?;
                }
            }
        }
        Ok(())
    }

    fn on_inv(&self, body: InvBody) -> Result<()> {
        match body.op_type {
            OpType::Block => {
                self.in_transit.add_blocks(&body.items)?;
                if let Some(hash) = body.items.into_iter().next() {
                    send_get_data(&self.peers, self.self_addr, body.addr_from, OpType::Block, hash);
                }
            }
            OpType::Tx => {
                if let Some(txid) = body.items.into_iter().next() {
                    let txid_hex = HEXLOWER.encode(&txid);
                    if !self.mempool.contains(&txid_hex)? {
                        send_get_data(&self.peers, self.self_addr, body.addr_from, OpType::Tx, txid);
                    }
                }
            }
        }
        Ok(())
    }

    fn on_block(&self, body: BlockBody) -> Result<()> {
        let block = Block::deserialize(&body.block)?;
        self.blockchain.add_block(&block)?;
        for tx in block.get_transactions() {
            self.mempool.remove(tx.clone())?;
        }

        self.in_transit.remove(block.get_hash())?;
        if self.in_transit.is_not_empty()? {
            if let Some(next_hash) = self.in_transit.first()? {
                send_get_data(&self.peers, self.self_addr, body.addr_from, OpType::Block, next_hash);
            }
        }
        Ok(())
    }

    fn on_tx(&self, body: TxBody) -> Result<()> {
        let tx = Transaction::deserialize(&body.transaction)?;
        self.accept_transaction(body.addr_from, tx)
    }

    /// Adds `tx` to the mempool, relays it to every peer but the sender,
    /// and mines a block once the mempool reaches `MINING_THRESHOLD` and
    /// this node has a configured mining address. `addr_from` is the
    /// originating peer to skip when relaying, or this node's own address
    /// for a locally-submitted transaction.
    pub fn accept_transaction(&self, addr_from: SocketAddr, tx: Transaction) -> Result<()> {
        let txid_hex = tx.get_id_hex();
        if self.mempool.contains(&txid_hex)? {
            return Ok(());
        }
        self.mempool.add(tx.clone())?;

        for peer in self.peers.get_nodes()? {
            if peer != addr_from && peer != self.self_addr {
                send_inv(&self.peers, self.self_addr, peer, OpType::Tx, vec![tx.get_id().to_vec()]);
            }
        }

        if let Some(miner_address) = self.miner_address.clone() {
            if self.mempool.len()? >= MINING_THRESHOLD {
                self.mine_pending(&miner_address)?;
            }
        }
        Ok(())
    }

    fn mine_pending(&self, miner_address: &str) -> Result<()> {
        let pending = self.mempool.get_all()?;
        let block = self.blockchain.mine_block(&pending, miner_address)?;
        info!("mined block {} at height {}", block.get_hash_hex(), block.get_height());
        for tx in pending {
            self.mempool.remove(tx)?;
        }
        for peer in self.peers.get_nodes()? {
            if peer != self.self_addr {
                send_inv(&self.peers, self.self_addr, peer, OpType::Block, vec![block.get_hash().to_vec()]);
            }
        }
        Ok(())
    }
}

/// Binds `self_addr` and serves incoming connections until the process
/// exits. Each connection runs on its own OS thread since both the wire
/// protocol and the stores behind it are synchronous.
pub fn listen(dispatcher: Arc<Dispatcher>) -> Result<()> {
    let listener =
        TcpListener::bind(dispatcher.self_addr).map_err(|e| BtcError::MalformedFrameError(e.to_string()))?;
    info!("gossip listening on {}", dispatcher.self_addr);
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let dispatcher = dispatcher.clone();
                std::thread::spawn(move || dispatcher.handle(stream));
            }
            Err(e) => error!("accept error: {}", e),
        }
    }
    Ok(())
}
