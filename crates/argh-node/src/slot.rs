//! Block assembly for the slot a local leader won (§4.7 step 4). Pure given
//! its inputs — the oracle fetch that feeds `oracle_observation` is the only
//! I/O, and it happens in the caller before this runs.

use std::collections::HashMap;

use argh_consensus::{aggregate_fee_rewards, Block, Chain};
use argh_core::{
    compute_txid, sha256_hex, sorted_json, Action, Address, FlarePayload, Protocol, Transaction,
    TxId,
};
use argh_crypto::ValidatorKeyPair;
use argh_treasury::{compute_delta, TreasuryAction};
use rand::RngCore;
use tracing::info;

use crate::oracle::OracleObservation;

pub struct AssembledBlock {
    pub block: Block,
    /// This producer's own reveal of the commit just embedded in `block`,
    /// for the next slot's leader to find in its mempool and include.
    pub reveal_tx: Transaction,
    pub included_txids: Vec<TxId>,
    pub invalidated_txids: Vec<TxId>,
}

/// Builds, signs, and returns the block this producer assembles for `slot`,
/// given the current tip (`chain`'s last block) and the contents of the
/// local mempool. `oracle_observation` must already be fetched and verified
/// by the caller (§4.7 step 6: an unreachable oracle skips the whole slot
/// before this function is ever called).
pub fn assemble_block(
    chain: &Chain,
    mempool_txs: &[Transaction],
    protocol: &Protocol,
    producer: &ValidatorKeyPair,
    slot: u64,
    oracle_observation: &OracleObservation,
) -> AssembledBlock {
    let tip = chain.tip().expect("genesis always present before slot production starts");
    let mut balances = chain.compute_balances();
    let mut transactions = Vec::new();
    let mut included_txids = Vec::new();

    // (a) reveal phase: find the mempool's flare_reveal matching the tip's
    // outstanding commit, and derive the treasury system tx from it.
    if let Some(commit) = tip.flare_commit.as_deref() {
        if let Some(reveal) = mempool_txs.iter().find(|tx| {
            matches!(&tx.action, Action::FlareReveal { commit: c, .. } if c == commit)
                && tx.sender == tip.producer_id
        }) {
            let Action::FlareReveal { payload, .. } = &reveal.action else {
                unreachable!("filtered to FlareReveal above");
            };
            let treasury_balance = balances.get(protocol.treasury, &protocol.native_asset);
            let (delta, action) = compute_delta(
                &payload.flux,
                payload.class,
                &payload.geomag,
                treasury_balance,
                protocol,
            );
            transactions.push(reveal.clone());
            included_txids.push(reveal.txid.clone());

            if let Some(action) = action {
                let system_action = match action {
                    TreasuryAction::Mint => Action::Mint {
                        asset: protocol.native_asset.clone(),
                        amount: delta,
                        to: protocol.treasury,
                    },
                    TreasuryAction::Burn => Action::Burn {
                        asset: protocol.native_asset.clone(),
                        amount: delta,
                    },
                };
                let tx = system_tx(system_action, protocol.treasury, 0, protocol.chain_id);
                let _ = argh_state::apply(&mut balances, &tx, protocol);
                transactions.push(tx);
            }
        }
    }

    // (b) select, validate, and apply pending user transactions in txid
    // order, enforcing per-sender nonce sequencing (the engine itself is
    // nonce-agnostic; sequencing is the assembler's job).
    let mut candidates: Vec<&Transaction> = mempool_txs
        .iter()
        .filter(|tx| !matches!(tx.action, Action::FlareReveal { .. }))
        .collect();
    candidates.sort_by(|a, b| a.txid.cmp(&b.txid));

    let mut next_nonce: HashMap<Address, u64> = chain.compute_nonces();
    let mut invalidated_txids = Vec::new();

    for tx in candidates {
        let expected = next_nonce.get(&tx.sender).copied().unwrap_or(0);
        if tx.nonce != expected {
            // Out of order, not invalid — leave it in the mempool for a
            // later block once its predecessor nonce lands.
            continue;
        }
        match argh_state::validate(tx, &balances, protocol, tx.is_system()) {
            Ok(()) => {
                if argh_state::apply(&mut balances, tx, protocol).is_err() {
                    invalidated_txids.push(tx.txid.clone());
                    continue;
                }
                next_nonce.insert(tx.sender, expected + 1);
                transactions.push(tx.clone());
                included_txids.push(tx.txid.clone());
            }
            Err(_) => invalidated_txids.push(tx.txid.clone()),
        }
    }

    // (c) aggregate included transfer fees into up to three reward txs.
    let rewards = aggregate_fee_rewards(&transactions, protocol, producer.address, 1);
    for reward in rewards {
        let _ = argh_state::apply(&mut balances, &reward, protocol);
        included_txids.push(reward.txid.clone());
        transactions.push(reward);
    }

    // (d) emit a new commit for this slot, carrying a fresh secret only
    // this producer holds until it reveals it next slot.
    let mut secret_bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut secret_bytes);
    let payload = FlarePayload {
        id: oracle_observation.id.clone(),
        slot,
        class: oracle_observation.class,
        flux: oracle_observation.flux.clone(),
        geomag: oracle_observation.geomag.clone(),
        secret: hex::encode(secret_bytes),
        oracle_signature: oracle_observation.oracle_signature.clone(),
    };
    let commit = sha256_hex(
        sorted_json(&serde_json::to_value(&payload).expect("FlarePayload serializes")).as_bytes(),
    );

    let mut block = Block::new(
        tip.index + 1,
        tip.hash.clone(),
        producer.address,
        slot,
        transactions,
        Some(commit.clone()),
        None,
    );
    block.signature = Some(hex::encode(producer.sign(block.hash.as_bytes()).to_bytes()));

    let reveal_action = Action::FlareReveal {
        commit,
        payload: payload.clone(),
    };
    let reveal_tx = system_tx(reveal_action, producer.address, 0, protocol.chain_id);

    info!(
        slot,
        index = block.index,
        included = included_txids.len(),
        invalidated = invalidated_txids.len(),
        "assembled block"
    );

    AssembledBlock {
        block,
        reveal_tx,
        included_txids,
        invalidated_txids,
    }
}

fn system_tx(action: Action, sender: Address, nonce: u64, chain_id: u64) -> Transaction {
    let txid = compute_txid(&action, nonce, chain_id);
    Transaction {
        txid,
        sender,
        action,
        nonce,
        chain_id,
        timestamp: chrono::Utc::now().timestamp(),
        signature: None,
    }
}
