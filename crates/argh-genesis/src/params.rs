//! Overridable genesis parameters, loaded from `genesis-params.json` (§6).
//! The defaults reproduce the historical reference deployment's fixture.

use argh_core::{Address, Amount, Asset, FeeDistribution, OracleConfig, Protocol};
use serde::{Deserialize, Serialize};

/// The two named transfer recipients and the bridge issuer in the reference
/// deployment's genesis fixture — real 20-byte addresses, unlike the
/// treasury/devs/orbital placeholder strings the historical source used
/// (`"0x0…xARGH"` and friends), which are not valid hex and were replaced
/// with synthetic addresses below.
pub const RECIPIENT_ONE: &str = "0xE357a324ACbE736c66A2C669ff8999aE79Ff22c5";
pub const RECIPIENT_TWO: &str = "0x344a144698E0BEBdd9A27CE4B93b13AFff5D623F";
pub const BRIDGE_ISSUER: &str = "0xd79Ee7A4143BBFF5316647C1d4b0B7461e4eb448";

/// Overridable knobs for building the genesis block. Every field has a
/// default matching the reference deployment's fixture; `genesis-params.json`
/// may override any of them (§6 "genesis-params.json").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisParams {
    pub protocol: Protocol,
    pub mint_native: Amount,
    pub mint_bridge_asset: Asset,
    pub mint_bridge_amount: Amount,
    pub recipient_one: Address,
    pub recipient_one_amount: Amount,
    pub recipient_two: Address,
    pub recipient_two_amount: Amount,
    pub pool_id: String,
    pub pool_native_amount: Amount,
    pub pool_paired_asset: Asset,
    pub pool_paired_amount: Amount,
}

impl Default for GenesisParams {
    fn default() -> Self {
        let native = Asset::new("ARGH");
        let bridge_asset = Asset::new("aUSD");
        // Synthetic, valid-hex stand-ins for the historical source's
        // non-hex treasury/devs/orbital placeholder strings.
        let treasury = Address::from_bytes([0x01; 20]);
        let devs = Address::from_bytes([0x02; 20]);
        let orbital = Address::from_bytes([0x03; 20]);

        Self {
            protocol: Protocol {
                treasury,
                devs,
                orbital,
                bridge_issuer: Address::from_hex(BRIDGE_ISSUER).expect("valid fixture address"),
                version: 1,
                chain_id: 1,
                soft_cap: Amount::from_whole(12_000_000),
                mint_scale: "0.08".to_string(),
                flux_scale: "1000000000000000000".to_string(),
                flux_normalizer: "10000000".to_string(),
                geomag_scale: "1000000".to_string(),
                transfer_fee_percent: "0.005".to_string(),
                fee_distribution: FeeDistribution {
                    devs: "0.25".to_string(),
                    orbital: "0.25".to_string(),
                    validator: "0.50".to_string(),
                },
                allowed_assets: vec![native.clone(), bridge_asset.clone()],
                native_asset: native,
                min_stake: Amount::from_whole(1_000),
                slot_duration: 60,
                oracle: OracleConfig {
                    pubkeys: vec![],
                    threshold: 1,
                },
            },
            mint_native: Amount::from_whole(550_000),
            mint_bridge_asset: bridge_asset,
            mint_bridge_amount: Amount::from_whole(5_000),
            recipient_one: Address::from_hex(RECIPIENT_ONE).expect("valid fixture address"),
            recipient_one_amount: Amount::from_whole(25_000),
            recipient_two: Address::from_hex(RECIPIENT_TWO).expect("valid fixture address"),
            recipient_two_amount: Amount::from_whole(25_000),
            pool_id: "aUSD-ARGH".to_string(),
            pool_native_amount: Amount::from_whole(500_000),
            pool_paired_asset: Asset::new("aUSD"),
            pool_paired_amount: Amount::from_whole(5_000),
        }
    }
}
