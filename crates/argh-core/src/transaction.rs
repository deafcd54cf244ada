use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Amount, Asset, Nonce, Timestamp, TxId};

// ── EthSignature ─────────────────────────────────────────────────────────────

/// A recoverable ECDSA secp256k1 signature over an Ethereum `personal_sign`
/// message: 32 bytes `r`, 32 bytes `s`, 1 byte recovery id (`0` or `1`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature(pub [u8; 65]);

impl EthSignature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthSignature({}…)", &self.to_hex()[..16])
    }
}

// ── Flare oracle payload ─────────────────────────────────────────────────────

/// Qualitative flare magnitude bucket. Classes A/B/C mint; M/X burn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlareClass {
    A,
    B,
    C,
    M,
    X,
}

impl fmt::Display for FlareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlareClass::A => "A",
            FlareClass::B => "B",
            FlareClass::C => "C",
            FlareClass::M => "M",
            FlareClass::X => "X",
        };
        write!(f, "{s}")
    }
}

/// The signed oracle observation disclosed by a `flare_reveal` transaction.
/// `secret` is the commit-scheme blinding factor: present in the payload
/// hashed into the commit, but never itself part of the oracle signature,
/// which covers only `{id, slot, class, flux, geomag}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlarePayload {
    pub id: String,
    pub slot: u64,
    pub class: FlareClass,
    /// Raw flux reading, scaled by `protocol.flux_scale` at interpretation time.
    pub flux: String,
    /// Geomagnetic index, scaled by `protocol.geomag_scale` at interpretation time.
    pub geomag: String,
    pub secret: String,
    pub oracle_signature: String,
}

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing operation recognized by the transaction engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Transfer {
        asset: Asset,
        amount: Amount,
        to: Address,
    },
    /// System-only: treasury-to-treasury native-asset mint.
    Mint {
        asset: Asset,
        amount: Amount,
        to: Address,
    },
    /// System-only: treasury-sourced native-asset burn.
    Burn {
        asset: Asset,
        amount: Amount,
    },
    /// Signed by the configured bridge issuer; mints a non-native asset.
    MintBridge {
        asset: Asset,
        amount: Amount,
        to: Address,
    },
    /// Seeds an AMM pool; swaps themselves are out of scope.
    AddLiquidity {
        pool_id: String,
        asset: Asset,
        amount: Amount,
        asset_paired: Asset,
        amount_paired: Amount,
    },
    /// System-only: sender is the synthetic `_protocol` address.
    Reward {
        asset: Asset,
        amount: Amount,
        to: Address,
    },
    /// Non-economic: discloses the previous block producer's committed
    /// flare observation so the treasury delta for this block can be derived.
    FlareReveal {
        commit: String,
        payload: FlarePayload,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Transfer { .. } => "transfer",
            Action::Mint { .. } => "mint",
            Action::Burn { .. } => "burn",
            Action::MintBridge { .. } => "mint_bridge",
            Action::AddLiquidity { .. } => "add_liquidity",
            Action::Reward { .. } => "reward",
            Action::FlareReveal { .. } => "flare_reveal",
        }
    }

    pub fn asset(&self) -> Option<&Asset> {
        match self {
            Action::Transfer { asset, .. }
            | Action::Mint { asset, .. }
            | Action::Burn { asset, .. }
            | Action::MintBridge { asset, .. }
            | Action::AddLiquidity { asset, .. }
            | Action::Reward { asset, .. } => Some(asset),
            Action::FlareReveal { .. } => None,
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Action::Transfer { amount, .. }
            | Action::Mint { amount, .. }
            | Action::Burn { amount, .. }
            | Action::MintBridge { amount, .. }
            | Action::AddLiquidity { amount, .. }
            | Action::Reward { amount, .. } => Some(*amount),
            Action::FlareReveal { .. } => None,
        }
    }

    pub fn to(&self) -> Option<&Address> {
        match self {
            Action::Transfer { to, .. }
            | Action::Mint { to, .. }
            | Action::MintBridge { to, .. }
            | Action::Reward { to, .. } => Some(to),
            Action::Burn { .. } | Action::AddLiquidity { .. } | Action::FlareReveal { .. } => None,
        }
    }

    /// `(pool_id, asset_paired, amount_paired)` for `add_liquidity`; these
    /// three fields are absent from the signing form but present in the
    /// consensus form.
    pub fn pool_extra(&self) -> Option<(&str, &Asset, Amount)> {
        match self {
            Action::AddLiquidity {
                pool_id,
                asset_paired,
                amount_paired,
                ..
            } => Some((pool_id, asset_paired, *amount_paired)),
            _ => None,
        }
    }

    pub fn is_system_only(&self) -> bool {
        matches!(
            self,
            Action::Mint { .. } | Action::Burn { .. } | Action::Reward { .. }
        )
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A fully-formed transaction. `txid` is `SHA256` of the canonical signing
/// form (§4.1); `signature` is `None` for system transactions (mint, burn,
/// reward) and for genesis transactions, `Some` otherwise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: TxId,
    pub sender: Address,
    pub action: Action,
    pub nonce: Nonce,
    pub chain_id: u64,
    pub timestamp: Timestamp,
    pub signature: Option<EthSignature>,
}

impl Transaction {
    pub fn is_system(&self) -> bool {
        self.signature.is_none()
    }
}
