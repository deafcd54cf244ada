//! The immutable protocol parameter set, embedded verbatim in the genesis
//! block and threaded through every validation path as a single context
//! object (§9 "Global module state → context object").

use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, Asset};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeeDistribution {
    pub devs: String,
    pub orbital: String,
    pub validator: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Hex-encoded Ed25519 public keys accepted as oracle signers.
    pub pubkeys: Vec<String>,
    pub threshold: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Protocol {
    pub treasury: Address,
    pub devs: Address,
    pub orbital: Address,
    pub bridge_issuer: Address,
    pub version: u32,
    pub chain_id: u64,
    /// Decimal string; treasury balances above this amplify burn deltas 1.5×.
    pub soft_cap: Amount,
    /// Decimal string ratio applied to the treasury engine's `base × intensity`.
    pub mint_scale: String,
    /// Large integer string; divides raw oracle flux readings.
    pub flux_scale: String,
    /// Large integer string; multiplies the normalized flux before `sqrt`.
    pub flux_normalizer: String,
    /// Large integer string; divides raw oracle geomagnetic readings.
    pub geomag_scale: String,
    /// Decimal string ratio, e.g. `"0.005"` for 0.5%.
    pub transfer_fee_percent: String,
    pub fee_distribution: FeeDistribution,
    pub allowed_assets: Vec<Asset>,
    pub native_asset: Asset,
    pub min_stake: Amount,
    pub slot_duration: u64,
    pub oracle: OracleConfig,
}

impl Protocol {
    pub fn is_allowed_asset(&self, asset: &Asset) -> bool {
        self.allowed_assets.iter().any(|a| a == asset)
    }
}
