//! Shared fixed-point parsing for protocol parameters that are not
//! themselves [`Amount`]s — ratios like `transfer_fee_percent` and large
//! scaling constants like `flux_scale`. These are kept as decimal strings in
//! [`crate::protocol::Protocol`] (mirroring the reference deployment's
//! string-typed genesis parameters) and parsed into fixed-point integers at
//! the precision each consumer needs, never through `f64::parse`.

use crate::error::CoreError;

/// Parses a (possibly fractional) decimal string into an integer scaled by
/// `10^decimals`, truncating toward zero beyond that precision. Used for
/// ratios such as `mint_scale = "0.08"` at `decimals = 18` and plain
/// integers such as `flux_scale = "1000000000000000000"` at `decimals = 0`.
pub fn parse_scaled(s: &str, decimals: u32) -> Result<u128, CoreError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CoreError::InvalidAmount(s.to_string()));
    }
    let mut parts = s.splitn(2, '.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next().unwrap_or("");
    let int_val: u128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| CoreError::InvalidAmount(s.to_string()))?
    };
    let mut digits: Vec<u8> = Vec::with_capacity(decimals as usize);
    for c in frac_part.chars() {
        if !c.is_ascii_digit() {
            return Err(CoreError::InvalidAmount(s.to_string()));
        }
        digits.push(c as u8 - b'0');
    }
    digits.truncate(decimals as usize);
    while digits.len() < decimals as usize {
        digits.push(0);
    }
    let mut frac_val: u128 = 0;
    for d in &digits {
        frac_val = frac_val * 10 + *d as u128;
    }
    let scale = 10u128.checked_pow(decimals).ok_or(CoreError::AmountOverflow)?;
    int_val
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or(CoreError::AmountOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fraction_at_requested_precision() {
        assert_eq!(parse_scaled("0.08", 18).unwrap(), 80_000_000_000_000_000);
    }

    #[test]
    fn parses_plain_integer_at_zero_precision() {
        assert_eq!(parse_scaled("12000000", 0).unwrap(), 12_000_000);
    }
}
