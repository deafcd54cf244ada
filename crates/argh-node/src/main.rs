//! argh-node — the validator node binary.
//!
//! Startup sequence:
//!   1. Load or generate `node.key` (AEAD key for every other encrypted file).
//!   2. Load `chain.enc`, or build and persist the genesis block if absent.
//!   3. Load the validator set from `nodes.json`.
//!   4. Load or generate this node's `validator.key`.
//!   5. Load or initialize `mempool.enc`.
//!   6. Start the P2P listener, heartbeat, and peer-dial background tasks.
//!   7. Run the slot production loop forever.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use argh_consensus::{select_leader, Block, Chain};
use argh_core::Address;
use argh_crypto::{decrypt, encrypt, NodeKey, ValidatorKeyPair};
use argh_genesis::{build_genesis, GenesisParams};
use argh_node::{assemble_block, config, fetch_observation, NodeError, NodeHandle, OracleObservation};
use argh_p2p::Network;
use argh_state::{load_or_generate_node_key, Mempool};

#[derive(Parser, Debug)]
#[command(name = "argh-node", version, about = "Validator node")]
struct Args {
    /// Directory holding node.key, chain.enc, mempool.enc, validator.key.
    #[arg(long)]
    data_dir: PathBuf,

    /// P2P bind address, e.g. 0.0.0.0:9000.
    #[arg(long)]
    listen: String,

    /// Optional extra peer address to dial on startup, beyond nodes.json.
    #[arg(long)]
    bootstrap: Option<String>,

    /// Path to genesis-params.json. Defaults to the built-in fixture.
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Path to nodes.json, naming the fixed validator set.
    #[arg(long)]
    nodes_file: PathBuf,

    /// Path to this node's validator.key. Defaults under --data-dir.
    #[arg(long)]
    validator_key: Option<PathBuf>,

    /// Base URL of the flare oracle, e.g. http://oracle.local:8090.
    #[arg(long)]
    oracle_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;

    let node_key =
        load_or_generate_node_key(args.data_dir.join("node.key")).context("loading node.key")?;

    let genesis_params = match &args.genesis_params {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing genesis-params.json")?
        }
        None => GenesisParams::default(),
    };

    let chain_path = args.data_dir.join("chain.enc");
    let chain = load_or_init_chain(&chain_path, &node_key, &genesis_params)
        .context("loading or initializing chain.enc")?;
    let protocol = chain
        .protocol()
        .cloned()
        .context("genesis block carries no protocol parameters")?;

    let validator_entries =
        config::load_validators(&args.nodes_file).context("loading nodes.json")?;
    let validators: Vec<Address> = validator_entries.iter().map(|e| e.id).collect();
    let validator_pubkeys: HashMap<Address, String> = validator_entries
        .iter()
        .map(|e| (e.id, e.pubkey.clone()))
        .collect();

    let validator_key_path = args
        .validator_key
        .clone()
        .unwrap_or_else(|| args.data_dir.join("validator.key"));
    let validator_kp = load_or_generate_validator_key(&validator_key_path, &node_key)
        .context("loading or generating validator.key")?;

    let my_entry = validator_entries
        .iter()
        .find(|e| e.id == validator_kp.address)
        .with_context(|| {
            format!(
                "this node's validator address {} is not listed in {}",
                validator_kp.address,
                args.nodes_file.display()
            )
        })?;
    let my_node_id = my_entry.id.to_hex();

    let mempool_path = args.data_dir.join("mempool.enc");
    let mempool = Mempool::new(&mempool_path);
    mempool
        .ensure_initialized(&node_key)
        .context("initializing mempool.enc")?;

    let node_key = Arc::new(node_key);
    let mempool = Arc::new(mempool);

    let network = Network::new(
        my_node_id,
        chain,
        node_key.clone(),
        mempool.clone(),
        chain_path,
        validators.clone(),
        validator_pubkeys,
    );

    {
        let network = network.clone();
        let listen_addr = args.listen.clone();
        tokio::spawn(async move {
            if let Err(err) = network.listen(&listen_addr).await {
                warn!(%err, "p2p listener stopped");
            }
        });
    }
    {
        let network = network.clone();
        tokio::spawn(async move { network.heartbeat().await });
    }

    let mut peers: Vec<(String, String)> = validator_entries
        .iter()
        .map(|e| (e.id.to_hex(), e.addr()))
        .collect();
    if let Some(bootstrap) = &args.bootstrap {
        peers.push((format!("bootstrap:{bootstrap}"), bootstrap.clone()));
    }
    network.connect_to_nodes(peers).await;

    let handle = NodeHandle::new(network.clone(), mempool.clone(), node_key.clone());
    let http_client = reqwest::Client::new();

    info!(address = %validator_kp.address, listen = %args.listen, "node started");

    run_slot_loop(
        &network,
        &handle,
        &http_client,
        &args.oracle_url,
        &validators,
        &validator_kp,
        &protocol,
    )
    .await;

    Ok(())
}

/// Runs forever, producing a block for every slot this node wins leader
/// election for (§4.7).
async fn run_slot_loop(
    network: &Network,
    handle: &NodeHandle,
    http_client: &reqwest::Client,
    oracle_url: &str,
    validators: &[Address],
    validator_kp: &ValidatorKeyPair,
    protocol: &argh_core::Protocol,
) {
    let slot_duration = protocol.slot_duration.max(1) as i64;
    let tip_slot = network
        .chain_snapshot()
        .await
        .tip()
        .map(|b| b.slot)
        .unwrap_or(0);
    let mut next_slot = tip_slot + 1;

    loop {
        let slot_start = next_slot as i64 * slot_duration;
        let now = chrono::Utc::now().timestamp();
        if now < slot_start {
            tokio::time::sleep(std::time::Duration::from_secs((slot_start - now) as u64)).await;
        }

        let now = chrono::Utc::now().timestamp();
        if now - slot_start > argh_core::SLOT_TOLERANCE_SECS {
            warn!(slot = next_slot, "past slot tolerance window, skipping");
            next_slot += 1;
            continue;
        }

        let chain = network.chain_snapshot().await;
        let tip = match chain.tip() {
            Some(tip) => tip.clone(),
            None => {
                next_slot += 1;
                continue;
            }
        };
        if tip.slot >= next_slot {
            next_slot = tip.slot + 1;
            continue;
        }

        let leader = select_leader(validators, &tip.hash, next_slot, 0);
        if leader != validator_kp.address {
            tokio::time::sleep(std::time::Duration::from_secs(
                argh_core::BLOCK_PROPAGATION_WAIT_SECS,
            ))
            .await;
            next_slot += 1;
            continue;
        }

        let slot = next_slot;
        match fetch_observation(http_client, oracle_url, slot, &protocol.oracle).await {
            Ok(observation) => {
                if let Err(err) = produce_block(
                    network,
                    handle,
                    &chain,
                    protocol,
                    validator_kp,
                    slot,
                    &observation,
                )
                .await
                {
                    warn!(slot, %err, "block production failed, skipping slot");
                }
            }
            Err(NodeError::OracleUnavailable(reason)) => {
                warn!(slot, reason = %reason, "oracle unavailable, skipping slot entirely");
            }
            Err(err) => {
                warn!(slot, %err, "unexpected oracle error, skipping slot");
            }
        }
        next_slot = slot + 1;
    }
}

async fn produce_block(
    network: &Network,
    handle: &NodeHandle,
    chain: &Chain,
    protocol: &argh_core::Protocol,
    validator_kp: &ValidatorKeyPair,
    slot: u64,
    observation: &OracleObservation,
) -> Result<(), NodeError> {
    let mempool = handle.mempool.clone();
    let node_key = handle.node_key.clone();
    let mempool_txs = {
        let mempool = mempool.clone();
        let node_key = node_key.clone();
        tokio::task::spawn_blocking(move || mempool.load(&node_key))
            .await
            .map_err(|e| NodeError::Config(format!("mempool load task panicked: {e}")))??
    };

    let assembled = assemble_block(chain, &mempool_txs, protocol, validator_kp, slot, observation);

    network.append_local_block(assembled.block.clone()).await;
    network.broadcast_block(&assembled.block).await;
    network.broadcast_tx(&assembled.reveal_tx).await;

    let reveal_tx = assembled.reveal_tx.clone();
    {
        let mempool = mempool.clone();
        let node_key = node_key.clone();
        let _ = tokio::task::spawn_blocking(move || mempool.add(&node_key, reveal_tx)).await;
    }

    let mut drop_ids = assembled.included_txids;
    drop_ids.extend(assembled.invalidated_txids);
    tokio::task::spawn_blocking(move || mempool.remove_many(&node_key, &drop_ids))
        .await
        .map_err(|e| NodeError::Config(format!("mempool prune task panicked: {e}")))??;

    info!(
        slot,
        index = assembled.block.index,
        "produced and broadcast block"
    );
    Ok(())
}

fn load_or_init_chain(
    path: &Path,
    key: &NodeKey,
    genesis_params: &GenesisParams,
) -> Result<Chain, NodeError> {
    if path.exists() {
        let raw = std::fs::read(path)?;
        let plaintext = decrypt(key, &raw)?;
        let blocks: Vec<Block> = serde_json::from_slice(&plaintext)?;
        let mut chain = Chain::new();
        for block in blocks {
            chain.push(block);
        }
        Ok(chain)
    } else {
        let genesis = build_genesis(genesis_params);
        let mut chain = Chain::new();
        chain.push(genesis);
        persist_new_chain(path, key, &chain)?;
        Ok(chain)
    }
}

fn persist_new_chain(path: &Path, key: &NodeKey, chain: &Chain) -> Result<(), NodeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let plaintext = serde_json::to_vec(&chain.blocks)?;
    let ciphertext = encrypt(key, &plaintext);
    std::fs::write(path, ciphertext)?;
    Ok(())
}

fn load_or_generate_validator_key(
    path: &Path,
    node_key: &NodeKey,
) -> Result<ValidatorKeyPair, NodeError> {
    if path.exists() {
        let raw = std::fs::read(path)?;
        let plaintext = decrypt(node_key, &raw)?;
        if plaintext.len() != 32 {
            return Err(NodeError::Config(format!(
                "validator.key has {} bytes, expected 32",
                plaintext.len()
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&plaintext);
        Ok(ValidatorKeyPair::from_seed(&seed))
    } else {
        let kp = ValidatorKeyPair::generate();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let ciphertext = encrypt(node_key, &kp.seed_bytes());
        std::fs::write(path, ciphertext)?;
        info!(address = %kp.address, path = %path.display(), "generated new validator key");
        Ok(kp)
    }
}
