//! Transfer fee computation (§4.3 "Fee function"), grounded on
//! `core/tx_engine.py::TransactionEngine.calculate_fee`.

use argh_core::{parse_scaled, Amount, Protocol};

pub struct FeeBreakdown {
    pub total: Amount,
    pub devs: Amount,
    pub orbital: Amount,
    pub validator: Amount,
}

fn quantize(scaled: u128, precision: u32) -> Amount {
    // scaled carries `precision` fractional digits; rescale to Amount's 8.
    let amount_digits: u32 = 8;
    if precision >= amount_digits {
        Amount::from_minor_units(scaled / 10u128.pow(precision - amount_digits))
    } else {
        Amount::from_minor_units(scaled * 10u128.pow(amount_digits - precision))
    }
}

/// `total = amount * transfer_fee_percent`, split `devs/orbital` with the
/// remainder going to the block's producer. All quantized (truncated) to 8
/// fractional digits, matching the reference `q()` helper's always-truncate
/// behavior.
pub fn calculate_fee(amount: Amount, protocol: &Protocol) -> FeeBreakdown {
    const PRECISION: u32 = 18;
    let percent = parse_scaled(&protocol.transfer_fee_percent, PRECISION).unwrap_or(0);
    let devs_ratio = parse_scaled(&protocol.fee_distribution.devs, PRECISION).unwrap_or(0);
    let orbital_ratio = parse_scaled(&protocol.fee_distribution.orbital, PRECISION).unwrap_or(0);

    let amount_scaled = amount.minor_units() * 10u128.pow(PRECISION - 8);
    let total_scaled = (amount_scaled * percent) / 10u128.pow(PRECISION);
    let total = quantize(total_scaled, PRECISION);

    let total_rescaled = total.minor_units() * 10u128.pow(PRECISION - 8);
    let devs_scaled = (total_rescaled * devs_ratio) / 10u128.pow(PRECISION);
    let devs = quantize(devs_scaled, PRECISION);

    let orbital_scaled = (total_rescaled * orbital_ratio) / 10u128.pow(PRECISION);
    let orbital = quantize(orbital_scaled, PRECISION);

    let validator = Amount::from_minor_units(
        total
            .minor_units()
            .saturating_sub(devs.minor_units())
            .saturating_sub(orbital.minor_units()),
    );

    FeeBreakdown {
        total,
        devs,
        orbital,
        validator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{Address, FeeDistribution, OracleConfig};

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

    #[test]
    fn ten_native_transfer_fee_matches_scenario_2() {
        let p = protocol();
        let fee = calculate_fee(Amount::from_whole(10), &p);
        assert_eq!(fee.total.to_decimal_string(), "0.05");
        assert_eq!(fee.devs.to_decimal_string(), "0.0125");
        assert_eq!(fee.orbital.to_decimal_string(), "0.0125");
        assert_eq!(fee.validator.to_decimal_string(), "0.025");
    }
}
