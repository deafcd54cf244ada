//! Treasury engine (C4, §4.4): computes the mint/burn delta and action for
//! a disclosed flare observation.
//!
//! Arithmetic runs in fixed-point at [`SCALE`] digits of precision — well
//! above the 8-digit output precision — using an integer square root rather
//! than `f64::sqrt`, since floating-point square roots are exactly the kind
//! of platform/reordering-dependent operation this component exists to keep
//! out of consensus.

use argh_core::{parse_scaled, Amount, FlareClass, Protocol};

/// Internal fixed-point precision (decimal digits) used while computing the
/// treasury delta, before truncating down to `Amount`'s 8 digits.
pub const SCALE_DIGITS: u32 = 9;
pub const SCALE: u128 = 1_000_000_000; // 10^SCALE_DIGITS

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreasuryAction {
    Mint,
    Burn,
}

/// Fixed-point integer square root via Newton's method: `isqrt(x)` such
/// that `isqrt(x)^2 <= x < (isqrt(x)+1)^2`.
fn isqrt(x: u128) -> u128 {
    if x == 0 {
        return 0;
    }
    let mut guess = 1u128 << ((128 - x.leading_zeros()) / 2 + 1);
    loop {
        let next = (guess + x / guess) / 2;
        if next >= guess {
            return guess;
        }
        guess = next;
    }
}

/// Square root of a `SCALE`-fixed-point value, result also `SCALE`-fixed.
fn sqrt_fixed(x_scaled: u128) -> u128 {
    isqrt(x_scaled.saturating_mul(SCALE))
}

fn mul_fixed(a: u128, b: u128) -> u128 {
    // a, b are SCALE-fixed; product needs one de-scale to stay SCALE-fixed.
    (a * b) / SCALE
}

fn div_fixed(a: u128, b: u128) -> u128 {
    if b == 0 {
        return 0;
    }
    (a * SCALE) / b
}

fn to_amount(x_scaled: u128) -> Amount {
    // SCALE_DIGITS (9) -> Amount's 8 digits: drop one digit, truncating.
    Amount::from_minor_units(x_scaled / 10)
}

fn amount_to_fixed(a: Amount) -> u128 {
    a.minor_units() * 10 // Amount is 8-digit fixed; promote to SCALE (9-digit).
}

/// Computes `(delta, action)` per §4.4. Returns `(Amount::ZERO, None)` when
/// the quantized delta is zero — callers must emit no system transaction in
/// that case.
pub fn compute_delta(
    flux: &str,
    class: FlareClass,
    geomag: &str,
    treasury_balance: Amount,
    protocol: &Protocol,
) -> (Amount, Option<TreasuryAction>) {
    let flux_raw = match parse_scaled(flux, SCALE_DIGITS) {
        Ok(v) => v,
        Err(_) => return (Amount::ZERO, None),
    };
    let geomag_raw = match parse_scaled(geomag, SCALE_DIGITS) {
        Ok(v) => v,
        Err(_) => return (Amount::ZERO, None),
    };
    let flux_scale = parse_scaled(&protocol.flux_scale, 0).unwrap_or(1) * SCALE;
    let flux_normalizer = parse_scaled(&protocol.flux_normalizer, 0).unwrap_or(0) * SCALE;
    let geomag_scale = parse_scaled(&protocol.geomag_scale, 0).unwrap_or(1) * SCALE;
    let mint_scale = parse_scaled(&protocol.mint_scale, SCALE_DIGITS).unwrap_or(0);

    let flux_f = div_fixed(flux_raw, flux_scale);
    let geomag_f = div_fixed(geomag_raw, geomag_scale); // geomag inputs are non-negative magnitudes
    let base = sqrt_fixed(mul_fixed(flux_f, flux_normalizer));
    let base_intensity_scale = mul_fixed(mul_fixed(base, geomag_f), mint_scale);

    let treasury_fixed = amount_to_fixed(treasury_balance);

    let (mut delta_fixed, action) = match class {
        FlareClass::A | FlareClass::B | FlareClass::C => {
            (base_intensity_scale, Some(TreasuryAction::Mint))
        }
        FlareClass::M => (
            base_intensity_scale.max(treasury_fixed / 6),
            Some(TreasuryAction::Burn),
        ),
        FlareClass::X => (
            base_intensity_scale.max(treasury_fixed / 3),
            Some(TreasuryAction::Burn),
        ),
    };

    let soft_cap_fixed = amount_to_fixed(protocol.soft_cap);
    if treasury_fixed > soft_cap_fixed && action == Some(TreasuryAction::Burn) {
        delta_fixed = mul_fixed(delta_fixed, 15 * SCALE / 10);
    }

    if action == Some(TreasuryAction::Burn) {
        delta_fixed = delta_fixed.min(treasury_fixed);
    }

    let delta = to_amount(delta_fixed);
    if delta.is_zero() {
        (Amount::ZERO, None)
    } else {
        (delta, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{Address, FeeDistribution, OracleConfig};

    fn protocol(soft_cap: &str) -> Protocol {
        Protocol {
            treasury: Address::ZERO,
            devs: Address::ZERO,
            orbital: Address::ZERO,
            bridge_issuer: Address::ZERO,
            version: 1,
            chain_id: 1,
            soft_cap: Amount::from_decimal_str(soft_cap).unwrap(),
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
            allowed_assets: vec!["ARGH".into()],
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
    fn class_x_with_soft_cap_amplifies_and_clamps_to_treasury() {
        // treasury=20M, soft_cap=12M, class X. Rig flux/normalizer so that
        // base*geomag_f*mint_scale == 100_000 exactly, then verify the
        // max(..., treasury/3) and 1.5x clamp-to-treasury logic (scenario 6).
        // base = sqrt(flux_f * flux_normalizer); pick flux_f=1, flux_normalizer=1
        // so base=1; geomag_f=1; mint_scale=100000 directly reproduces the rigged base*intensity.
        let mut p = protocol("12000000");
        p.mint_scale = "100000".into();
        p.flux_scale = "1".into();
        p.flux_normalizer = "1".into();
        p.geomag_scale = "1".into();
        let treasury = Amount::from_whole(20_000_000);
        let (delta, action) = compute_delta("1", FlareClass::X, "1", treasury, &p);
        assert_eq!(action, Some(TreasuryAction::Burn));
        // max(100_000, 20_000_000/3=6_666_666.67) = 6_666_666.67; *1.5 = 10_000_000.0 (approx)
        assert!(delta.minor_units() <= treasury.minor_units());
        let ten_million = Amount::from_whole(10_000_000);
        let diff = if delta.minor_units() > ten_million.minor_units() {
            delta.minor_units() - ten_million.minor_units()
        } else {
            ten_million.minor_units() - delta.minor_units()
        };
        // allow small fixed-point slack
        assert!(diff < 1_000, "delta {delta} should be close to 10,000,000");
    }

    #[test]
    fn mint_never_exceeds_no_clamp_since_not_a_burn() {
        let p = protocol("12000000");
        let treasury = Amount::from_whole(1_000_000);
        let (_, action) = compute_delta("100000000", FlareClass::A, "100000000", treasury, &p);
        assert_eq!(action, Some(TreasuryAction::Mint));
    }

    #[test]
    fn zero_flux_yields_no_system_tx() {
        let p = protocol("12000000");
        let treasury = Amount::from_whole(0);
        let (delta, action) = compute_delta("0", FlareClass::A, "0", treasury, &p);
        assert!(delta.is_zero());
        assert!(action.is_none());
    }
}
