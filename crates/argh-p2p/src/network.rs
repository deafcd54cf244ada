//! The peer-to-peer layer: raw-TCP peers framed per [`crate::message`],
//! status/sync reconciliation, live-block propagation, and tx gossip (§4.8).
//! Grounded on `core/network.py::P2PNetwork`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use argh_consensus::{validate_block, Block, Chain};
use argh_core::{Address, TxId, HEARTBEAT_INTERVAL_SECS, MEMPOOL_DEDUP_CAP, SYNC_PAGE_SIZE};
use argh_crypto::{encrypt, NodeKey};
use argh_state::Mempool;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::equivocation::EquivocationRegistry;
use crate::error::NetworkError;
use crate::message::{read_message, write_message, Message};

pub struct PeerHandle {
    writer: Mutex<OwnedWriteHalf>,
}

struct Inner {
    chain: Chain,
    validators: Vec<Address>,
    validator_pubkeys: HashMap<Address, String>,
    peers: HashMap<String, Arc<PeerHandle>>,
    equivocation: EquivocationRegistry,
    syncing: bool,
    sync_target: Option<u64>,
    buffered_blocks: Vec<Block>,
    seen_tx_order: VecDeque<TxId>,
    seen_tx_set: HashSet<TxId>,
}

/// Shared node state plus the TCP peer set. Clone is cheap — it's an `Arc`
/// handle, so every peer task and the slot loop operate on the same chain
/// and mempool.
#[derive(Clone)]
pub struct Network {
    my_node_id: String,
    node_key: Arc<NodeKey>,
    mempool: Arc<Mempool>,
    chain_path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl Network {
    pub fn new(
        my_node_id: String,
        chain: Chain,
        node_key: Arc<NodeKey>,
        mempool: Arc<Mempool>,
        chain_path: PathBuf,
        validators: Vec<Address>,
        validator_pubkeys: HashMap<Address, String>,
    ) -> Self {
        Self {
            my_node_id,
            node_key,
            mempool,
            chain_path,
            inner: Arc::new(Mutex::new(Inner {
                chain,
                validators,
                validator_pubkeys,
                peers: HashMap::new(),
                equivocation: EquivocationRegistry::new(),
                syncing: false,
                sync_target: None,
                buffered_blocks: Vec::new(),
                seen_tx_order: VecDeque::new(),
                seen_tx_set: HashSet::new(),
            })),
        }
    }

    pub async fn chain_snapshot(&self) -> Chain {
        self.inner.lock().await.chain.clone()
    }

    /// Re-encrypts and writes the full block list to `chain.enc` (§6).
    /// Offloaded to the blocking pool so JSON encoding of a long chain never
    /// stalls the cooperative scheduler.
    async fn persist_chain(&self) {
        let blocks = self.inner.lock().await.chain.blocks.clone();
        let key = self.node_key.clone();
        let path = self.chain_path.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<(), NetworkError> {
            let plaintext = serde_json::to_vec(&blocks)?;
            let ciphertext = encrypt(&key, &plaintext);
            std::fs::write(&path, ciphertext)?;
            Ok(())
        })
        .await;
        if let Ok(Err(err)) = result {
            warn!(%err, "failed to persist chain");
        }
    }

    /// Appends a block the slot loop just produced and signed to the local
    /// chain, registers it against the equivocation registry, and persists.
    /// Callers broadcast separately via [`Network::broadcast_block`].
    pub async fn append_local_block(&self, block: Block) {
        let mut inner = self.inner.lock().await;
        if inner
            .equivocation
            .observe(block.producer_id, block.slot, &block.hash)
            .is_some()
        {
            warn!(slot = block.slot, "local block collided with a prior equivocation entry");
        }
        inner.chain.push(block);
        let slot = inner.chain.tip().map(|b| b.slot).unwrap_or(0);
        inner.equivocation.prune(slot);
        drop(inner);
        self.persist_chain().await;
    }

    /// Binds the listener and accepts inbound peer connections forever.
    pub async fn listen(self, addr: &str) -> Result<(), NetworkError> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr, "p2p listener bound");
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let net = self.clone();
            tokio::spawn(async move {
                if let Err(err) = net.handle_inbound(stream).await {
                    warn!(%peer_addr, %err, "inbound peer session ended");
                }
            });
        }
    }

    /// Dials every configured peer once, retrying on failure. Runs forever
    /// as a background task per the original's reconnect loop.
    pub async fn connect_to_nodes(&self, nodes: Vec<(String, String)>) {
        for (node_id, addr) in nodes {
            if node_id.eq_ignore_ascii_case(&self.my_node_id) {
                continue;
            }
            let net = self.clone();
            tokio::spawn(async move { net.dial_until_connected(node_id, addr).await });
        }
    }

    async fn dial_until_connected(&self, node_id: String, addr: String) {
        loop {
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    if let Err(err) = self.handshake_outbound(stream).await {
                        warn!(%addr, %err, "outbound handshake failed");
                    } else {
                        info!(%addr, "connected to peer");
                        return;
                    }
                }
                Err(err) => {
                    warn!(%addr, %err, "connection failed, retrying");
                }
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
    }

    async fn handshake_outbound(&self, stream: TcpStream) -> Result<(), NetworkError> {
        let (mut reader, mut writer) = stream.into_split();
        write_message(
            &mut writer,
            &Message::Handshake {
                node_id: self.my_node_id.clone(),
            },
        )
        .await?;
        let peer_id = match read_message(&mut reader).await? {
            Message::Handshake { node_id } => node_id,
            _ => return Err(NetworkError::UnexpectedMessage),
        };

        let (status, handle) = {
            let mut inner = self.inner.lock().await;
            let handle = Arc::new(PeerHandle {
                writer: Mutex::new(writer),
            });
            inner.peers.insert(peer_id.clone(), handle.clone());
            (self.status_message(&inner), handle)
        };
        self.write_to(&handle, &status).await?;

        let net = self.clone();
        tokio::spawn(async move { net.listen_peer(peer_id, reader).await });
        Ok(())
    }

    async fn handle_inbound(&self, stream: TcpStream) -> Result<(), NetworkError> {
        let (mut reader, mut writer) = stream.into_split();
        let msg = tokio::time::timeout(Duration::from_secs(5), read_message(&mut reader))
            .await
            .map_err(|_| NetworkError::NoHandshake)??;
        let peer_id = match msg {
            Message::Handshake { node_id } => node_id,
            _ => return Err(NetworkError::NoHandshake),
        };
        if peer_id == self.my_node_id {
            return Ok(());
        }

        let (status, handle, already_known) = {
            let mut inner = self.inner.lock().await;
            let already_known = inner.peers.contains_key(&peer_id);
            let handle = Arc::new(PeerHandle {
                writer: Mutex::new(writer),
            });
            if !already_known {
                inner.peers.insert(peer_id.clone(), handle.clone());
            }
            (self.status_message(&inner), handle, already_known)
        };
        if already_known {
            return Ok(());
        }

        write_message(
            &mut *handle.writer.lock().await,
            &Message::Handshake {
                node_id: self.my_node_id.clone(),
            },
        )
        .await?;
        self.write_to(&handle, &status).await?;
        info!(peer_id, "peer connected");

        self.listen_peer(peer_id, reader).await
    }

    async fn listen_peer<R>(&self, peer_id: String, mut reader: R)
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            match read_message(&mut reader).await {
                Ok(msg) => {
                    if let Err(err) = self.handle_message(&peer_id, msg).await {
                        warn!(peer_id, %err, "message handling failed");
                    }
                }
                Err(err) => {
                    info!(peer_id, %err, "peer disconnected");
                    break;
                }
            }
        }
        self.inner.lock().await.peers.remove(&peer_id);
    }

    async fn write_to(&self, handle: &PeerHandle, msg: &Message) -> Result<(), NetworkError> {
        let mut writer = handle.writer.lock().await;
        tokio::time::timeout(
            Duration::from_secs(argh_core::PEER_WRITE_DRAIN_TIMEOUT_SECS),
            write_message(&mut *writer, msg),
        )
        .await
        .map_err(|_| NetworkError::WriteTimeout)??;
        Ok(())
    }

    async fn send_to_peer(&self, peer_id: &str, msg: &Message) -> Result<(), NetworkError> {
        let handle = {
            let inner = self.inner.lock().await;
            inner.peers.get(peer_id).cloned()
        };
        match handle {
            Some(handle) => self.write_to(&handle, msg).await,
            None => Ok(()),
        }
    }

    async fn broadcast_except(&self, excluded: &str, msg: &Message) {
        let peers = {
            let inner = self.inner.lock().await;
            inner
                .peers
                .iter()
                .filter(|(id, _)| id.as_str() != excluded)
                .map(|(id, h)| (id.clone(), h.clone()))
                .collect::<Vec<_>>()
        };
        let mut dead = Vec::new();
        for (id, handle) in peers {
            if self.write_to(&handle, msg).await.is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            let mut inner = self.inner.lock().await;
            for id in dead {
                inner.peers.remove(&id);
            }
        }
    }

    /// Periodically pings every peer, dropping ones that fail to drain.
    pub async fn heartbeat(&self) {
        loop {
            tokio::time::sleep(Duration::from_secs(HEARTBEAT_INTERVAL_SECS)).await;
            let peers = {
                let inner = self.inner.lock().await;
                inner
                    .peers
                    .iter()
                    .map(|(id, h)| (id.clone(), h.clone()))
                    .collect::<Vec<_>>()
            };
            let mut dead = Vec::new();
            for (id, handle) in peers {
                if self.write_to(&handle, &Message::Ping).await.is_err() {
                    dead.push(id);
                }
            }
            if !dead.is_empty() {
                let mut inner = self.inner.lock().await;
                for id in dead {
                    inner.peers.remove(&id);
                }
            }
        }
    }

    fn status_message(&self, inner: &Inner) -> Message {
        Message::Status {
            latest_index: inner.chain.tip().map(|b| b.index).unwrap_or(0),
            latest_hash: inner
                .chain
                .tip()
                .map(|b| b.hash.clone())
                .unwrap_or_default(),
        }
    }

    async fn handle_message(&self, peer_id: &str, msg: Message) -> Result<(), NetworkError> {
        match msg {
            Message::Status {
                latest_index,
                latest_hash,
            } => self.on_status(peer_id, latest_index, latest_hash).await,
            Message::GetBlocks { from } => self.on_get_blocks(peer_id, from).await,
            Message::Blocks { data } => self.on_blocks(peer_id, data).await,
            Message::Block { data } => self.on_block(peer_id, data).await,
            Message::GetBlock { index } => self.on_get_block(peer_id, index).await,
            Message::SingleBlock { data } => self.on_single_block(data).await,
            Message::Tx { data } => self.on_tx(peer_id, data).await,
            Message::Ping => self.send_to_peer(peer_id, &Message::Pong).await,
            Message::Pong => Ok(()),
            Message::Handshake { .. } => Err(NetworkError::UnexpectedMessage),
        }
    }

    async fn on_status(
        &self,
        peer_id: &str,
        peer_index: u64,
        peer_hash: String,
    ) -> Result<(), NetworkError> {
        let (local_index, local_hash, should_sync, should_get_block) = {
            let mut inner = self.inner.lock().await;
            if inner.syncing {
                if let Some(target) = inner.sync_target {
                    if peer_index <= target {
                        return Ok(());
                    }
                }
            }
            let local_index = inner.chain.tip().map(|b| b.index).unwrap_or(0);
            let local_hash = inner
                .chain
                .tip()
                .map(|b| b.hash.clone())
                .unwrap_or_default();

            if peer_index == local_index && peer_hash == local_hash {
                (local_index, local_hash, false, false)
            } else if peer_index > local_index {
                inner.syncing = true;
                inner.sync_target = Some(peer_index);
                (local_index, local_hash, true, false)
            } else if peer_index < local_index {
                (local_index, local_hash, false, false)
            } else {
                (local_index, local_hash, false, true)
            }
        };

        if should_sync {
            self.send_to_peer(peer_id, &Message::GetBlocks { from: local_index + 1 })
                .await?;
        } else if should_get_block {
            self.send_to_peer(peer_id, &Message::GetBlock { index: local_index })
                .await?;
        }
        Ok(())
    }

    async fn on_get_blocks(&self, peer_id: &str, from: u64) -> Result<(), NetworkError> {
        let pages: Vec<Vec<Block>> = {
            let inner = self.inner.lock().await;
            let blocks = inner
                .chain
                .blocks
                .iter()
                .filter(|b| b.index >= from)
                .cloned()
                .collect::<Vec<_>>();
            if blocks.is_empty() {
                vec![Vec::new()]
            } else {
                blocks
                    .chunks(SYNC_PAGE_SIZE)
                    .map(|chunk| chunk.to_vec())
                    .collect()
            }
        };
        for page in pages {
            self.send_to_peer(peer_id, &Message::Blocks { data: page })
                .await?;
        }
        Ok(())
    }

    async fn on_blocks(&self, _peer_id: &str, received: Vec<Block>) -> Result<(), NetworkError> {
        let page_len = received.len();
        for block in received {
            let mut inner = self.inner.lock().await;
            if inner.chain.blocks.is_empty() {
                if block.index != 0 {
                    warn!("expected genesis, received something else");
                    return Ok(());
                }
                let empty = Chain::new();
                if validate_block(&block, None, &empty, &inner.validators, &inner.validator_pubkeys)
                    .is_err()
                {
                    warn!("invalid genesis received during sync");
                    return Ok(());
                }
                if inner
                    .equivocation
                    .observe(block.producer_id, block.slot, &block.hash)
                    .is_some()
                {
                    warn!("double signing detected on synced genesis");
                    return Ok(());
                }
                inner.chain.push(block);
                drop(inner);
                self.persist_chain().await;
                continue;
            }

            let chain_until_prev = inner.chain.clone();
            let prev = chain_until_prev.tip().cloned();
            let validators = inner.validators.clone();
            let pubkeys = inner.validator_pubkeys.clone();
            if validate_block(&block, prev.as_ref(), &chain_until_prev, &validators, &pubkeys)
                .is_err()
            {
                warn!("sync failed: invalid block");
                return Ok(());
            }
            if let Some(prev) = &prev {
                if block.prev_hash != prev.hash {
                    warn!("long fork detected, sync aborted");
                    return Ok(());
                }
            }
            if inner
                .equivocation
                .observe(block.producer_id, block.slot, &block.hash)
                .is_some()
            {
                warn!("double signing detected during sync");
                return Ok(());
            }
            inner.chain.push(block);
            drop(inner);
            self.persist_chain().await;
        }

        if page_len >= SYNC_PAGE_SIZE {
            return Ok(());
        }

        let mut inner = self.inner.lock().await;
        inner.syncing = false;
        inner.sync_target = None;

        let mut buffered = std::mem::take(&mut inner.buffered_blocks);
        buffered.sort_by_key(|b| b.index);
        let mut remaining = Vec::new();
        for block in buffered {
            let local_tip = inner.chain.tip().map(|b| b.index).unwrap_or(0);
            if block.index == local_tip + 1 {
                let chain_snapshot = inner.chain.clone();
                let prev = chain_snapshot.tip().cloned();
                let validators = inner.validators.clone();
                let pubkeys = inner.validator_pubkeys.clone();
                if validate_block(&block, prev.as_ref(), &chain_snapshot, &validators, &pubkeys)
                    .is_ok()
                {
                    let included: Vec<TxId> =
                        block.transactions.iter().map(|t| t.txid.clone()).collect();
                    inner.chain.push(block);
                    drop_mempool_entries(&self.mempool, &self.node_key, &included);
                } else {
                    warn!("buffered block invalid, discarded");
                }
            } else {
                remaining.push(block);
            }
        }
        inner.buffered_blocks = remaining;
        inner.equivocation.prune(inner.chain.tip().map(|b| b.slot).unwrap_or(0));
        drop(inner);
        self.persist_chain().await;
        info!("sync completed");
        Ok(())
    }

    async fn on_block(&self, peer_id: &str, block: Block) -> Result<(), NetworkError> {
        let (local_tip, syncing) = {
            let inner = self.inner.lock().await;
            (inner.chain.tip().map(|b| b.index).unwrap_or(0), inner.syncing)
        };

        if block.index <= local_tip {
            return Ok(());
        }

        if block.index == local_tip + 1 {
            let mut inner = self.inner.lock().await;
            let chain_snapshot = inner.chain.clone();
            let prev = chain_snapshot.tip().cloned();
            let validators = inner.validators.clone();
            let pubkeys = inner.validator_pubkeys.clone();
            if validate_block(&block, prev.as_ref(), &chain_snapshot, &validators, &pubkeys)
                .is_err()
            {
                warn!("live block invalid");
                return Ok(());
            }
            if inner
                .equivocation
                .observe(block.producer_id, block.slot, &block.hash)
                .is_some()
            {
                warn!("double signing detected");
                return Ok(());
            }
            let included: Vec<TxId> = block.transactions.iter().map(|t| t.txid.clone()).collect();
            inner.chain.push(block);
            inner.equivocation.prune(inner.chain.tip().map(|b| b.slot).unwrap_or(0));
            drop(inner);
            self.persist_chain().await;
            drop_mempool_entries(&self.mempool, &self.node_key, &included);
            info!("block added");
            return Ok(());
        }

        warn!(local_tip, received = block.index, "gap detected");
        if syncing {
            self.inner.lock().await.buffered_blocks.push(block);
            return Ok(());
        }
        self.inner.lock().await.syncing = true;
        self.send_to_peer(peer_id, &Message::GetBlocks { from: local_tip + 1 })
            .await
    }

    async fn on_get_block(&self, peer_id: &str, index: u64) -> Result<(), NetworkError> {
        let block = {
            let inner = self.inner.lock().await;
            inner.chain.blocks.get(index as usize).cloned()
        };
        if let Some(block) = block {
            self.send_to_peer(peer_id, &Message::SingleBlock { data: block })
                .await?;
        }
        Ok(())
    }

    /// Same-slot fork tie-break: when a peer's version of our current tip
    /// validates just as well as ours, the lexicographically smaller hash
    /// wins (§4.7 "same-slot fork tie-break").
    async fn on_single_block(&self, incoming: Block) -> Result<(), NetworkError> {
        let mut inner = self.inner.lock().await;
        if inner.chain.blocks.is_empty() {
            return Ok(());
        }
        let local_index = inner.chain.blocks.len() - 1;
        let local_block = inner.chain.blocks[local_index].clone();
        if incoming.index != local_block.index {
            return Ok(());
        }

        let mut chain_until_prev = inner.chain.clone();
        chain_until_prev.blocks.pop();
        let prev = chain_until_prev.tip().cloned();
        let validators = inner.validators.clone();
        let pubkeys = inner.validator_pubkeys.clone();

        let incoming_valid =
            validate_block(&incoming, prev.as_ref(), &chain_until_prev, &validators, &pubkeys)
                .is_ok();
        if !incoming_valid {
            warn!("peer fork invalid, ignoring");
            return Ok(());
        }

        let local_valid =
            validate_block(&local_block, prev.as_ref(), &chain_until_prev, &validators, &pubkeys)
                .is_ok();
        if !local_valid {
            warn!("local block invalid, rolling back");
            inner.chain.blocks[local_index] = incoming;
            drop(inner);
            self.persist_chain().await;
            return Ok(());
        }

        if incoming.hash < local_block.hash {
            info!("tie-break: peer wins");
            if inner
                .equivocation
                .observe(incoming.producer_id, incoming.slot, &incoming.hash)
                .is_some()
            {
                warn!("double signing detected at tie-break");
                return Ok(());
            }
            inner.chain.blocks[local_index] = incoming;
            let slot = inner.chain.tip().map(|b| b.slot).unwrap_or(0);
            inner.equivocation.prune(slot);
            drop(inner);
            self.persist_chain().await;
        } else {
            info!("keeping local block");
        }
        Ok(())
    }

    async fn on_tx(&self, peer_id: &str, tx: argh_core::Transaction) -> Result<(), NetworkError> {
        let fresh = {
            let mut inner = self.inner.lock().await;
            if inner.seen_tx_set.contains(&tx.txid) {
                false
            } else {
                inner.seen_tx_set.insert(tx.txid.clone());
                inner.seen_tx_order.push_back(tx.txid.clone());
                if inner.seen_tx_order.len() > MEMPOOL_DEDUP_CAP {
                    if let Some(oldest) = inner.seen_tx_order.pop_front() {
                        inner.seen_tx_set.remove(&oldest);
                    }
                }
                true
            }
        };
        if !fresh {
            return Ok(());
        }

        let mempool = self.mempool.clone();
        let node_key = self.node_key.clone();
        let tx_for_add = tx.clone();
        let added = tokio::task::spawn_blocking(move || mempool.add(&node_key, tx_for_add))
            .await
            .unwrap_or(Ok(false))
            .unwrap_or(false);
        if !added {
            return Ok(());
        }
        info!(txid = %tx.txid, "accepted tx through gossip");
        self.broadcast_except(peer_id, &Message::Tx { data: tx }).await;
        Ok(())
    }

    /// Broadcasts a freshly produced block to every peer (§4.7 step f).
    pub async fn broadcast_block(&self, block: &Block) {
        self.broadcast_except("", &Message::Block { data: block.clone() })
            .await;
    }

    /// Gossips a locally submitted transaction to every peer.
    pub async fn broadcast_tx(&self, tx: &argh_core::Transaction) {
        self.broadcast_except("", &Message::Tx { data: tx.clone() })
            .await;
    }
}

fn drop_mempool_entries(mempool: &Arc<Mempool>, key: &Arc<NodeKey>, txids: &[TxId]) {
    let mempool = mempool.clone();
    let key = key.clone();
    let txids = txids.to_vec();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || mempool.remove_many(&key, &txids)).await;
        if let Ok(Err(err)) = result {
            warn!(%err, "failed to prune mempool after block inclusion");
        }
    });
}
