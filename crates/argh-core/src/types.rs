use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Unix timestamp (seconds, UTC). Advisory only — excluded from every
/// canonical form and from block hashing.
pub type Timestamp = i64;

/// Sender-scoped transaction sequence number. Zero-based; system
/// transactions carry none.
pub type Nonce = u64;

// ── Address ──────────────────────────────────────────────────────────────────

/// A 20-byte account identifier, rendered as `0x` + lowercase hex.
///
/// Two distinct derivations produce an `Address`: `SHA256(ed25519_pubkey)[-20:]`
/// for validators, and `Keccak256(secp256k1_pubkey)[-20:]` for user wallets
/// (see `argh-crypto`). `Address` itself is agnostic to which one produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(CoreError::InvalidAddress(format!(
                "expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl FromStr for Address {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

// ── Asset ────────────────────────────────────────────────────────────────────

/// A short ASCII asset symbol (e.g. `"ARGH"`, `"aUSD"`). Comparisons are
/// case-sensitive — unlike addresses, asset symbols are not normalized.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(pub String);

impl Asset {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.0)
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Amount ───────────────────────────────────────────────────────────────────

/// Number of minor units per whole unit of any asset (8 fractional digits).
pub const AMOUNT_SCALE: u128 = 100_000_000;

/// A non-negative fixed-point amount with 8 fractional digits, stored as an
/// exact integer count of minor units (`10^-8`). Arithmetic never touches
/// floating point; the only float-adjacent operation is the decimal-string
/// parse/format at the serialization boundary, and even that goes through
/// exact integer scaling rather than `f64::parse`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_minor_units(u: u128) -> Self {
        Self(u)
    }

    pub fn from_whole(units: u128) -> Self {
        Self(units * AMOUNT_SCALE)
    }

    pub fn minor_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parses a decimal string (e.g. `"10.5"`, `"100"`) into minor units,
    /// truncating toward zero beyond the 8th fractional digit — mirrors
    /// `Decimal.quantize(..., rounding=ROUND_DOWN)` in the reference
    /// implementation, which always truncates regardless of the dropped digits.
    pub fn from_decimal_str(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::InvalidAmount(s.to_string()));
        }
        let (sign, rest) = match s.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, s),
        };
        if sign {
            return Err(CoreError::InvalidAmount(s.to_string()));
        }
        let mut parts = rest.splitn(2, '.');
        let int_part = parts.next().unwrap_or("0");
        let frac_part = parts.next().unwrap_or("");
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(CoreError::InvalidAmount(s.to_string()));
        }
        let int_val: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| CoreError::InvalidAmount(s.to_string()))?
        };
        let mut frac_digits: Vec<u8> = Vec::with_capacity(8);
        for c in frac_part.chars() {
            if !c.is_ascii_digit() {
                return Err(CoreError::InvalidAmount(s.to_string()));
            }
            frac_digits.push(c as u8 - b'0');
        }
        frac_digits.truncate(8);
        while frac_digits.len() < 8 {
            frac_digits.push(0);
        }
        let mut frac_val: u128 = 0;
        for d in &frac_digits {
            frac_val = frac_val * 10 + *d as u128;
        }
        let minor = int_val
            .checked_mul(AMOUNT_SCALE)
            .and_then(|v| v.checked_add(frac_val))
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Amount(minor))
    }

    /// Renders as a decimal string with up to 8 fractional digits, trailing
    /// zeros trimmed (but at least one digit before the point).
    pub fn to_decimal_string(&self) -> String {
        let whole = self.0 / AMOUNT_SCALE;
        let frac = self.0 % AMOUNT_SCALE;
        if frac == 0 {
            whole.to_string()
        } else {
            let frac_str = format!("{:08}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            format!("{whole}.{trimmed}")
        }
    }

    /// Whether a raw (possibly-over-precise) decimal string would round-trip
    /// through 8 fractional digits without loss — used by the transaction
    /// engine to reject amounts with excess precision rather than silently
    /// truncating them.
    pub fn is_canonical_decimal_str(s: &str) -> bool {
        match s.split_once('.') {
            Some((_, frac)) => frac.len() <= 8 && frac.chars().all(|c| c.is_ascii_digit()),
            None => true,
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal_string())
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Amount({})", self.to_decimal_string())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_decimal_str(&s).map_err(serde::de::Error::custom)
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: `SHA256` of the canonical signing form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidTxId(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(CoreError::InvalidTxId(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_round_trips_through_decimal_string() {
        let a = Amount::from_decimal_str("1234.5").unwrap();
        assert_eq!(a.to_decimal_string(), "1234.5");
        assert_eq!(a.minor_units(), 123_450_000_000);
    }

    #[test]
    fn amount_truncates_beyond_eight_fractional_digits() {
        let a = Amount::from_decimal_str("0.123456789").unwrap();
        assert_eq!(a.minor_units(), 12_345_678);
    }

    #[test]
    fn amount_rejects_negative() {
        assert!(Amount::from_decimal_str("-1").is_err());
    }

    #[test]
    fn address_hex_round_trip_is_case_insensitive_on_input() {
        let a = Address::from_hex("0xAABBCCDDEEFF00112233445566778899aabbccdd").unwrap();
        let b = Address::from_hex(&a.to_hex()).unwrap();
        assert_eq!(a, b);
    }
}
