//! Fee-to-reward aggregation for block assembly (§4.7 step c). Collects the
//! fee debited by every included `transfer` into exactly three system
//! `reward` transactions (devs, orbital, block producer), rather than
//! crediting each recipient inline per-transfer — this is what keeps
//! `argh_state::apply`'s `transfer` case from double-crediting (§4.3
//! "Application semantics").

use argh_core::{compute_txid, Action, Address, Amount, Asset, Protocol, Transaction};
use argh_state::calculate_fee;

/// Sums the fee breakdown of every non-system `transfer` in `included`, and
/// returns up to three `reward` transactions crediting devs, orbital, and
/// `producer` respectively. A zero-sum recipient is omitted rather than
/// emitting a zero-amount reward tx.
pub fn aggregate_fee_rewards(
    included: &[Transaction],
    protocol: &Protocol,
    producer: Address,
    next_nonce_hint: u64,
) -> Vec<Transaction> {
    let mut devs_total = Amount::ZERO;
    let mut orbital_total = Amount::ZERO;
    let mut validator_total = Amount::ZERO;

    for tx in included {
        if tx.is_system() {
            continue;
        }
        if let Action::Transfer { amount, .. } = &tx.action {
            let fee = calculate_fee(*amount, protocol);
            devs_total = devs_total.checked_add(fee.devs).unwrap_or(devs_total);
            orbital_total = orbital_total
                .checked_add(fee.orbital)
                .unwrap_or(orbital_total);
            validator_total = validator_total
                .checked_add(fee.validator)
                .unwrap_or(validator_total);
        }
    }

    let native = &protocol.native_asset;
    let mut rewards = Vec::with_capacity(3);
    let mut nonce = next_nonce_hint;
    for (recipient, amount) in [
        (protocol.devs, devs_total),
        (protocol.orbital, orbital_total),
        (producer, validator_total),
    ] {
        if amount.is_zero() {
            continue;
        }
        rewards.push(reward_tx(native, amount, recipient, protocol.chain_id, nonce));
        nonce += 1;
    }
    rewards
}

fn reward_tx(asset: &Asset, amount: Amount, to: Address, chain_id: u64, nonce: u64) -> Transaction {
    let action = Action::Reward {
        asset: asset.clone(),
        amount,
        to,
    };
    let txid = compute_txid(&action, nonce, chain_id);
    Transaction {
        txid,
        // Reward txs are system-only (authorized by `signature.is_none()`,
        // not by sender identity); `Address` has no textual variant for the
        // original `_protocol` sentinel sender, so the zero address stands
        // in as an unused placeholder here.
        sender: Address::ZERO,
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
    use argh_core::{Address, FeeDistribution, OracleConfig};

    fn protocol() -> Protocol {
        Protocol {
            treasury: Address::ZERO,
            devs: Address::from_bytes([0xd; 20]),
            orbital: Address::from_bytes([0xe; 20]),
            bridge_issuer: Address::ZERO,
            version: 1,
            chain_id: 1,
            soft_cap: Amount::from_whole(12_000_000),
            mint_scale: "0.08".into(),
            flux_scale: "1".into(),
            flux_normalizer: "1".into(),
            geomag_scale: "1".into(),
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

    fn transfer(amount: Amount, nonce: u64) -> Transaction {
        let action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount,
            to: Address::from_bytes([1; 20]),
        };
        let txid = compute_txid(&action, nonce, 1);
        Transaction {
            txid,
            sender: Address::from_bytes([9; 20]),
            action,
            nonce,
            chain_id: 1,
            timestamp: 0,
            signature: Some(argh_core::EthSignature([0u8; 65])),
        }
    }

    #[test]
    fn aggregates_fee_from_a_single_ten_unit_transfer() {
        let p = protocol();
        let included = vec![transfer(Amount::from_whole(10), 0)];
        let rewards = aggregate_fee_rewards(&included, &p, Address::from_bytes([0xaa; 20]), 0);
        assert_eq!(rewards.len(), 3);
        let devs_reward = rewards
            .iter()
            .find(|tx| tx.action.to() == Some(&p.devs))
            .unwrap();
        assert_eq!(devs_reward.action.amount().unwrap().to_decimal_string(), "0.0125");
    }

    #[test]
    fn no_transfers_yields_no_reward_txs() {
        let p = protocol();
        let rewards = aggregate_fee_rewards(&[], &p, Address::from_bytes([0xaa; 20]), 0);
        assert!(rewards.is_empty());
    }
}
