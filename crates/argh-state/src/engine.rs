//! The transaction engine (C3, §4.3): `validate` then `apply`, grounded on
//! `core/tx_engine.py::TransactionEngine`. Validation is pure (never mutates
//! `balances`); application mutates it in place.

use argh_core::{signing_message, Action, Amount, Protocol, Transaction};
use argh_crypto::eth::recover_personal_sign;

use crate::balances::{BalanceKeyAddr, Balances};
use crate::error::TxEngineError;
use crate::fee::calculate_fee;

/// Validates `tx` against `balances`/`protocol` without mutating anything.
/// `system` must match `tx.is_system()`; callers pass it explicitly because
/// genesis construction validates transactions before a `txid`-bearing
/// `Transaction` even has a signature slot to check against.
pub fn validate(
    tx: &Transaction,
    balances: &Balances,
    protocol: &Protocol,
    system: bool,
) -> Result<(), TxEngineError> {
    if tx.chain_id != protocol.chain_id {
        return Err(TxEngineError::InvalidChainId);
    }

    if let Some(amount) = tx.action.amount() {
        if amount.is_zero() {
            return Err(TxEngineError::InvalidAmount);
        }
    }

    if !system {
        let signature = tx
            .signature
            .as_ref()
            .ok_or(TxEngineError::InvalidSignature)?;
        let message = signing_message(tx);
        let recovered =
            recover_personal_sign(&message, signature).ok_or(TxEngineError::InvalidSignature)?;
        if recovered != tx.sender {
            return Err(TxEngineError::InvalidSignature);
        }
    }

    match &tx.action {
        Action::Transfer { asset, amount, to } => {
            let _ = to;
            if !protocol.is_allowed_asset(asset) {
                return Err(TxEngineError::UnsupportedAsset);
            }
            let fee_total = if system {
                Amount::ZERO
            } else {
                calculate_fee(*amount, protocol).total
            };
            if asset == &protocol.native_asset {
                let required = amount
                    .checked_add(fee_total)
                    .ok_or(TxEngineError::InvalidAmount)?;
                if balances.get(tx.sender, &protocol.native_asset) < required {
                    return Err(TxEngineError::InsufficientNativeBalanceForFee);
                }
            } else {
                if balances.get(tx.sender, asset) < *amount {
                    return Err(TxEngineError::InsufficientAssetBalance);
                }
                if !fee_total.is_zero() && balances.get(tx.sender, &protocol.native_asset) < fee_total
                {
                    return Err(TxEngineError::InsufficientNativeBalanceForFee);
                }
            }
            Ok(())
        }

        Action::MintBridge { asset, to: _, .. } => {
            if tx.sender != protocol.bridge_issuer {
                return Err(TxEngineError::UnauthorizedBridgeMintIssuer);
            }
            if asset == &protocol.native_asset || !protocol.is_allowed_asset(asset) {
                return Err(TxEngineError::AssetIneligibleForBridgeMint);
            }
            Ok(())
        }

        Action::Mint { asset, to, .. } => {
            if !system {
                return Err(TxEngineError::MintMustBeSystem);
            }
            if asset != &protocol.native_asset {
                return Err(TxEngineError::OnlyNativeCanBeSystemMinted);
            }
            let _ = to;
            Ok(())
        }

        Action::Burn { asset, .. } => {
            if !system {
                return Err(TxEngineError::BurnMustBeSystem);
            }
            if asset != &protocol.native_asset {
                return Err(TxEngineError::OnlyNativeCanBeSystemMinted);
            }
            Ok(())
        }

        Action::AddLiquidity {
            asset,
            amount,
            asset_paired,
            amount_paired,
            ..
        } => {
            if asset.as_str().is_empty() || asset_paired.as_str().is_empty() {
                return Err(TxEngineError::MissingLiquidityAssets);
            }
            if balances.get(tx.sender, asset) < *amount {
                return Err(TxEngineError::InsufficientLiquidityBalance);
            }
            if balances.get(tx.sender, asset_paired) < *amount_paired {
                return Err(TxEngineError::InsufficientLiquidityBalance);
            }
            Ok(())
        }

        Action::Reward { .. } => {
            if !system {
                return Err(TxEngineError::RewardMustBeSystem);
            }
            Ok(())
        }

        Action::FlareReveal { .. } => Ok(()),
    }
}

/// Applies `tx` to `balances`. Must be called only after [`validate`]
/// succeeds. Fee-to-reward bookkeeping (crediting devs/orbital/validator) is
/// not done here — the block assembler (§4.7) emits separate `reward` system
/// transactions for that, applied through this same function.
pub fn apply(
    balances: &mut Balances,
    tx: &Transaction,
    protocol: &Protocol,
) -> Result<(), argh_core::CoreError> {
    match &tx.action {
        Action::Transfer { asset, amount, to } => {
            balances.debit(tx.sender, asset, *amount)?;
            balances.credit(*to, asset, *amount)?;
            if !tx.is_system() {
                let fee = calculate_fee(*amount, protocol);
                balances.debit(tx.sender, &protocol.native_asset, fee.total)?;
            }
        }
        Action::MintBridge { asset, amount, to } => {
            balances.credit(*to, asset, *amount)?;
        }
        Action::Mint { asset, amount, to } => {
            balances.credit(*to, asset, *amount)?;
        }
        Action::Burn { asset, amount } => {
            balances.debit(tx.sender, asset, *amount)?;
        }
        Action::AddLiquidity {
            pool_id,
            asset,
            amount,
            asset_paired,
            amount_paired,
        } => {
            balances.debit(tx.sender, asset, *amount)?;
            balances.debit(tx.sender, asset_paired, *amount_paired)?;
            balances.credit(BalanceKeyAddr::Pool(pool_id.clone()), asset, *amount)?;
            balances.credit(
                BalanceKeyAddr::Pool(pool_id.clone()),
                asset_paired,
                *amount_paired,
            )?;
        }
        Action::Reward { asset, amount, to } => {
            balances.credit(*to, asset, *amount)?;
        }
        Action::FlareReveal { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{compute_txid, Address, Asset, FeeDistribution, OracleConfig, TxId};
    use argh_crypto::eth::EthKeyPair;

    fn protocol() -> Protocol {
        Protocol {
            treasury: Address::ZERO,
            devs: Address::ZERO,
            orbital: Address::ZERO,
            bridge_issuer: Address::from_hex("0x000000000000000000000000000000000000aa").unwrap(),
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
            allowed_assets: vec!["ARGH".into(), "aUSD".into()],
            native_asset: "ARGH".into(),
            min_stake: Amount::from_whole(1000),
            slot_duration: 60,
            oracle: OracleConfig {
                pubkeys: vec![],
                threshold: 1,
            },
        }
    }

    fn signed_transfer(kp: &EthKeyPair, nonce: u64, to: Address, amount: Amount) -> Transaction {
        let action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount,
            to,
        };
        let txid = compute_txid(&action, nonce, 1);
        let mut tx = Transaction {
            txid: txid.clone(),
            sender: kp.address,
            action,
            nonce,
            chain_id: 1,
            timestamp: 0,
            signature: None,
        };
        let message = signing_message(&tx);
        tx.signature = Some(kp.personal_sign(&message));
        tx
    }

    #[test]
    fn transfer_with_sufficient_balance_and_fee_validates_and_applies() {
        let kp = EthKeyPair::generate();
        let p = protocol();
        let mut balances = Balances::new();
        balances
            .credit(kp.address, &p.native_asset, Amount::from_whole(100))
            .unwrap();
        let bob = Address::from_hex("0x000000000000000000000000000000000000bb").unwrap();
        let tx = signed_transfer(&kp, 0, bob, Amount::from_whole(10));

        validate(&tx, &balances, &p, false).unwrap();
        apply(&mut balances, &tx, &p).unwrap();

        assert_eq!(balances.get(bob, &p.native_asset).to_decimal_string(), "10");
        assert_eq!(
            balances.get(kp.address, &p.native_asset).to_decimal_string(),
            "89.95"
        );
    }

    #[test]
    fn transfer_with_insufficient_balance_is_rejected() {
        let kp = EthKeyPair::generate();
        let p = protocol();
        let mut balances = Balances::new();
        balances
            .credit(kp.address, &p.native_asset, Amount::from_whole(5))
            .unwrap();
        let bob = Address::from_hex("0x000000000000000000000000000000000000bb").unwrap();
        let tx = signed_transfer(&kp, 0, bob, Amount::from_whole(10));

        assert_eq!(
            validate(&tx, &balances, &p, false).unwrap_err(),
            TxEngineError::InsufficientNativeBalanceForFee
        );
    }

    #[test]
    fn tampered_amount_fails_signature_recovery() {
        let kp = EthKeyPair::generate();
        let p = protocol();
        let balances = Balances::new();
        let bob = Address::from_hex("0x000000000000000000000000000000000000bb").unwrap();
        let mut tx = signed_transfer(&kp, 0, bob, Amount::from_whole(10));
        tx.action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount: Amount::from_whole(1000),
            to: bob,
        };

        assert_eq!(
            validate(&tx, &balances, &p, false).unwrap_err(),
            TxEngineError::InvalidSignature
        );
    }

    #[test]
    fn mint_bridge_rejects_non_issuer_sender() {
        let p = protocol();
        let balances = Balances::new();
        let not_issuer = Address::from_hex("0x000000000000000000000000000000000000cc").unwrap();
        let action = Action::MintBridge {
            asset: Asset::new("aUSD"),
            amount: Amount::from_whole(10),
            to: not_issuer,
        };
        let txid = compute_txid(&action, 0, 1);
        let tx = Transaction {
            txid,
            sender: not_issuer,
            action,
            nonce: 0,
            chain_id: 1,
            timestamp: 0,
            signature: Some(argh_core::EthSignature([0u8; 65])),
        };
        assert_eq!(
            validate(&tx, &balances, &p, false).unwrap_err(),
            TxEngineError::UnauthorizedBridgeMintIssuer
        );
    }

    #[test]
    fn system_mint_of_non_native_asset_is_rejected() {
        let p = protocol();
        let balances = Balances::new();
        let action = Action::Mint {
            asset: Asset::new("aUSD"),
            amount: Amount::from_whole(10),
            to: p.treasury,
        };
        let txid = compute_txid(&action, 0, 1);
        let tx = Transaction {
            txid,
            sender: p.treasury,
            action,
            nonce: 0,
            chain_id: 1,
            timestamp: 0,
            signature: None,
        };
        assert_eq!(
            validate(&tx, &balances, &p, true).unwrap_err(),
            TxEngineError::OnlyNativeCanBeSystemMinted
        );
    }

    #[test]
    fn add_liquidity_debits_sender_and_credits_pool() {
        let kp = EthKeyPair::generate();
        let p = protocol();
        let mut balances = Balances::new();
        balances
            .credit(kp.address, &Asset::new("ARGH"), Amount::from_whole(500_000))
            .unwrap();
        balances
            .credit(kp.address, &Asset::new("aUSD"), Amount::from_whole(5_000))
            .unwrap();

        let action = Action::AddLiquidity {
            pool_id: "aUSD-ARGH".into(),
            asset: Asset::new("ARGH"),
            amount: Amount::from_whole(500_000),
            asset_paired: Asset::new("aUSD"),
            amount_paired: Amount::from_whole(5_000),
        };
        let txid: TxId = compute_txid(&action, 0, 1);
        let tx = Transaction {
            txid,
            sender: kp.address,
            action,
            nonce: 0,
            chain_id: 1,
            timestamp: 0,
            signature: Some(kp.personal_sign(b"placeholder, unused by apply()")),
        };
        // Exercises apply() only; a real signature over the actual signing
        // form is covered by signed_transfer()'s use in the transfer tests.
        apply(&mut balances, &tx, &p).unwrap();

        assert!(balances.get(kp.address, &Asset::new("ARGH")).is_zero());
        assert_eq!(
            balances
                .get_pool("aUSD-ARGH", &Asset::new("ARGH"))
                .to_decimal_string(),
            "500000"
        );
        assert_eq!(
            balances
                .get_pool("aUSD-ARGH", &Asset::new("aUSD"))
                .to_decimal_string(),
            "5000"
        );
    }
}
