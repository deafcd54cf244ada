//! The block validator (C5, §4.5). Grounded on
//! `core/block_validator.py::BlockValidator.validate`.

use std::collections::HashMap;

use argh_core::{sorted_json, Action, Address};
use argh_crypto::{verify_ed25519_hex, verify_oracle_signature};
use argh_state::Balances;
use argh_treasury::{compute_delta, TreasuryAction};

use crate::block::Block;
use crate::chain::Chain;
use crate::error::BlockValidationError;
use crate::leader::select_leader;

/// Validates `block` against its predecessor `prev` and the balances derived
/// from `chain_until_prev` (everything strictly before `block`).
/// `validator_pubkeys` maps each validator's address to its hex-encoded
/// Ed25519 public key.
///
/// On success, returns the balances after `block` has been applied, so
/// callers (the slot loop, P2P sync) don't have to replay the whole chain a
/// second time.
pub fn validate_block(
    block: &Block,
    prev: Option<&Block>,
    chain_until_prev: &Chain,
    validators: &[Address],
    validator_pubkeys: &HashMap<Address, String>,
) -> Result<Balances, BlockValidationError> {
    if block.is_genesis() {
        validate_genesis(block)?;
        return Ok(Balances::new());
    }

    let prev = prev.ok_or(BlockValidationError::BadIndex)?;
    let protocol = chain_until_prev
        .protocol()
        .ok_or(BlockValidationError::MissingProtocolState)?;

    // ── Continuity ───────────────────────────────────────────────────────
    if block.index != prev.index + 1 {
        return Err(BlockValidationError::BadIndex);
    }
    if block.prev_hash != prev.hash {
        return Err(BlockValidationError::BadPrevHash);
    }
    if block.slot <= prev.slot {
        return Err(BlockValidationError::BadSlot);
    }

    // ── Integrity ────────────────────────────────────────────────────────
    if block.recompute_hash() != block.hash {
        return Err(BlockValidationError::BadHash);
    }

    // ── Commit/reveal ────────────────────────────────────────────────────
    let reveals: Vec<&argh_core::Transaction> = block
        .transactions
        .iter()
        .filter(|tx| matches!(tx.action, Action::FlareReveal { .. }))
        .collect();
    if reveals.len() > 1 {
        return Err(BlockValidationError::MultipleFlareReveals);
    }
    let reveal = reveals.first().copied();

    if let Some(reveal) = reveal {
        let Action::FlareReveal { commit, payload } = &reveal.action else {
            unreachable!("filtered to FlareReveal above");
        };
        if reveal.sender != prev.producer_id {
            return Err(BlockValidationError::RevealSenderMismatch);
        }
        let prev_commit = prev
            .flare_commit
            .as_deref()
            .ok_or(BlockValidationError::RevealCommitMismatch)?;
        let payload_hash = argh_core::sha256_hex(
            sorted_json(&serde_json::to_value(payload).expect("FlarePayload serializes")).as_bytes(),
        );
        if payload_hash.as_str() != prev_commit || commit.as_str() != prev_commit {
            return Err(BlockValidationError::RevealCommitMismatch);
        }
        if payload.slot != prev.slot {
            return Err(BlockValidationError::RevealSlotMismatch);
        }
        let signed_payload = serde_json::json!({
            "id": payload.id,
            "slot": payload.slot,
            "class": payload.class,
            "flux": payload.flux,
            "geomag": payload.geomag,
        });
        let message = sorted_json(&signed_payload);
        if !verify_oracle_signature(
            &protocol.oracle,
            message.as_bytes(),
            &payload.oracle_signature,
        ) {
            return Err(BlockValidationError::InvalidOracleSignature);
        }
    }

    // ── Treasury system tx ───────────────────────────────────────────────
    let balances_before = chain_until_prev.compute_balances();
    let treasury_balance = balances_before.get(protocol.treasury, &protocol.native_asset);

    let expected = reveal.map(|reveal| {
        let Action::FlareReveal { payload, .. } = &reveal.action else {
            unreachable!()
        };
        compute_delta(
            &payload.flux,
            payload.class,
            &payload.geomag,
            treasury_balance,
            protocol,
        )
    });

    let system_txs: Vec<&argh_core::Transaction> = block
        .transactions
        .iter()
        .filter(|tx| matches!(tx.action, Action::Mint { .. } | Action::Burn { .. }))
        .collect();

    match expected {
        None | Some((_, None)) => {
            if !system_txs.is_empty() {
                return Err(BlockValidationError::UnexpectedSystemTx);
            }
        }
        Some((expected_delta, Some(expected_action))) => {
            if system_txs.len() != 1 {
                return Err(BlockValidationError::MissingSystemTx);
            }
            let tx = system_txs[0];
            let matches_action = match (&tx.action, expected_action) {
                (Action::Mint { .. }, TreasuryAction::Mint) => true,
                (Action::Burn { .. }, TreasuryAction::Burn) => true,
                _ => false,
            };
            if !matches_action {
                return Err(BlockValidationError::WrongSystemAction);
            }
            if tx.action.amount() != Some(expected_delta) {
                return Err(BlockValidationError::WrongSystemAmount);
            }
        }
    }

    // ── Leader ───────────────────────────────────────────────────────────
    let expected_leader = select_leader(validators, &prev.hash, block.slot, 0);
    if block.producer_id != expected_leader {
        return Err(BlockValidationError::UnauthorizedProducer);
    }

    // ── Signature ────────────────────────────────────────────────────────
    let signature = block
        .signature
        .as_deref()
        .ok_or(BlockValidationError::MissingSignature)?;
    let pubkey_hex = validator_pubkeys
        .get(&block.producer_id)
        .ok_or(BlockValidationError::UnknownProducer)?;
    if !verify_ed25519_hex(pubkey_hex, block.hash.as_bytes(), signature) {
        return Err(BlockValidationError::InvalidSignature);
    }

    // ── Per-tx validate + apply ──────────────────────────────────────────
    let mut balances = balances_before;
    for (index, tx) in block.transactions.iter().enumerate() {
        let system = tx.is_system();
        argh_state::validate(tx, &balances, protocol, system)
            .map_err(|source| BlockValidationError::TxRejected { index, source })?;
        argh_state::apply(&mut balances, tx, protocol)
            .map_err(|source| BlockValidationError::ApplyFailed { index, source })?;
    }

    Ok(balances)
}

fn validate_genesis(block: &Block) -> Result<(), BlockValidationError> {
    if block.prev_hash != "0".repeat(64) {
        return Err(BlockValidationError::GenesisBadPrevHash);
    }
    if block.slot != 0 {
        return Err(BlockValidationError::GenesisBadSlot);
    }
    if block.signature.is_some() {
        return Err(BlockValidationError::GenesisHasSignature);
    }
    if block.protocol.is_none() {
        return Err(BlockValidationError::GenesisMissingProtocol);
    }
    if block.producer_id != crate::block::genesis_producer() {
        return Err(BlockValidationError::GenesisBadProducer);
    }
    if block.recompute_hash() != block.hash {
        return Err(BlockValidationError::BadHash);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{Amount, Asset, FeeDistribution, OracleConfig, Protocol};

    fn protocol() -> Protocol {
        Protocol {
            treasury: Address::ZERO,
            devs: Address::ZERO,
            orbital: Address::ZERO,
            bridge_issuer: Address::ZERO,
            version: 1,
            chain_id: 1,
            soft_cap: Amount::from_whole(12_000_000),
            mint_scale: "0.08".into(),
            flux_scale: "1000000000000000000".into(),
            flux_normalizer: "10000000".into(),
            geomag_scale: "1000000".into(),
            transfer_fee_percent: "0.005".into(),
            fee_distribution: FeeDistribution {
                devs: "0.25".into(),
                orbital: "0.25".into(),
                validator: "0.50".into(),
            },
            allowed_assets: vec![Asset::new("ARGH")],
            native_asset: Asset::new("ARGH"),
            min_stake: Amount::from_whole(1000),
            slot_duration: 60,
            oracle: OracleConfig {
                pubkeys: vec![],
                threshold: 1,
            },
        }
    }

    #[test]
    fn genesis_block_validates() {
        let block = Block::new(
            0,
            "0".repeat(64),
            crate::block::genesis_producer(),
            0,
            vec![],
            None,
            Some(protocol()),
        );
        let chain = Chain::new();
        let result = validate_block(&block, None, &chain, &[], &HashMap::new());
        assert!(result.is_ok());
    }

    #[test]
    fn genesis_with_nonzero_slot_is_rejected() {
        let mut block = Block::new(
            0,
            "0".repeat(64),
            crate::block::genesis_producer(),
            1,
            vec![],
            None,
            Some(protocol()),
        );
        block.hash = block.recompute_hash();
        let chain = Chain::new();
        let err = validate_block(&block, None, &chain, &[], &HashMap::new()).unwrap_err();
        assert_eq!(err, BlockValidationError::GenesisBadSlot);
    }
}
