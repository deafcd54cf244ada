//! Builds the genesis block from scratch (§6, §8 "Genesis fixture").
//!
//! Genesis allocations, all from the configured treasury address and at
//! nonces `0..4`:
//!
//! 1. Mint 550,000 of the native asset to the treasury.
//! 2. Mint 5,000 `aUSD` (bridge/liquidity collateral) to the treasury.
//! 3. Transfer 25,000 native to a named recipient.
//! 4. Transfer 25,000 native to a second named recipient.
//! 5. Seed the `aUSD-ARGH` pool with 500,000 native / 5,000 aUSD via `add_liquidity`.
//!
//! Genesis transactions are unsigned and never pass through
//! `argh_state::validate` — `argh_consensus::validate::validate_block` takes
//! a structural-only path for index 0 — so the native-asset-only restriction
//! on `Action::Mint` that applies to every later block does not apply here.

pub mod params;

pub use params::GenesisParams;

use argh_consensus::{genesis_producer, Block};
use argh_core::{compute_txid, Action, Transaction};
use tracing::info;

/// Builds the genesis block for `params`. Deterministic except for the
/// embedded transaction timestamps, which are advisory only (§3 "Amount" /
/// codec docs: timestamps are excluded from every canonical form and from
/// block hashing), so the block hash is stable across runs.
pub fn build_genesis(params: &GenesisParams) -> Block {
    let treasury = params.protocol.treasury;
    let chain_id = params.protocol.chain_id;

    let mint_native = system_tx(
        Action::Mint {
            asset: params.protocol.native_asset.clone(),
            amount: params.mint_native,
            to: treasury,
        },
        treasury,
        0,
        chain_id,
    );
    let mint_bridge = system_tx(
        Action::Mint {
            asset: params.mint_bridge_asset.clone(),
            amount: params.mint_bridge_amount,
            to: treasury,
        },
        treasury,
        1,
        chain_id,
    );
    let transfer_one = system_tx(
        Action::Transfer {
            asset: params.protocol.native_asset.clone(),
            amount: params.recipient_one_amount,
            to: params.recipient_one,
        },
        treasury,
        2,
        chain_id,
    );
    let transfer_two = system_tx(
        Action::Transfer {
            asset: params.protocol.native_asset.clone(),
            amount: params.recipient_two_amount,
            to: params.recipient_two,
        },
        treasury,
        3,
        chain_id,
    );
    let seed_pool = system_tx(
        Action::AddLiquidity {
            pool_id: params.pool_id.clone(),
            asset: params.protocol.native_asset.clone(),
            amount: params.pool_native_amount,
            asset_paired: params.pool_paired_asset.clone(),
            amount_paired: params.pool_paired_amount,
        },
        treasury,
        4,
        chain_id,
    );

    let transactions = vec![mint_native, mint_bridge, transfer_one, transfer_two, seed_pool];

    info!(
        treasury = %treasury,
        native_mint = %params.mint_native.to_decimal_string(),
        bridge_mint = %params.mint_bridge_amount.to_decimal_string(),
        "building genesis block"
    );

    Block::new(
        0,
        "0".repeat(64),
        genesis_producer(),
        0,
        transactions,
        None,
        Some(params.protocol.clone()),
    )
}

fn system_tx(action: Action, sender: argh_core::Address, nonce: u64, chain_id: u64) -> Transaction {
    let txid = compute_txid(&action, nonce, chain_id);
    Transaction {
        txid,
        sender,
        action,
        nonce,
        chain_id,
        timestamp: 0,
        signature: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_consensus::Chain;

    #[test]
    fn genesis_hash_is_stable_across_rebuilds() {
        let params = GenesisParams::default();
        let a = build_genesis(&params);
        let b = build_genesis(&params);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn treasury_balance_is_zero_after_transfers_and_pool_seed() {
        let params = GenesisParams::default();
        let block = build_genesis(&params);
        let mut chain = Chain::new();
        chain.push(block);

        let balances = chain.compute_balances();
        let native = &params.protocol.native_asset;
        assert_eq!(
            balances.get(params.protocol.treasury, native).to_decimal_string(),
            "0"
        );
        assert_eq!(
            balances
                .get(params.protocol.treasury, &params.mint_bridge_asset)
                .to_decimal_string(),
            "0"
        );
    }

    #[test]
    fn recipients_and_pool_receive_their_genesis_allocations() {
        let params = GenesisParams::default();
        let block = build_genesis(&params);
        let mut chain = Chain::new();
        chain.push(block);

        let balances = chain.compute_balances();
        let native = &params.protocol.native_asset;
        assert_eq!(
            balances.get(params.recipient_one, native).to_decimal_string(),
            "25000"
        );
        assert_eq!(
            balances.get(params.recipient_two, native).to_decimal_string(),
            "25000"
        );
        assert_eq!(
            balances.get_pool(&params.pool_id, native).to_decimal_string(),
            "500000"
        );
    }
}
