//! Oracle observation multi-signature verification (§4.5 step 5).

use argh_core::protocol::OracleConfig;

use crate::keypair::verify_ed25519_hex;

/// Returns true iff at least `config.threshold` of `config.pubkeys` produce
/// a valid Ed25519 signature over `message`. A single signature is checked
/// against every configured pubkey (the wire format carries one signature
/// string, not one per key) — this matches a threshold scheme where any
/// `threshold`-sized subset of oracle operators could have produced it, but
/// in practice `oracle_signature` is one signature and `threshold` gates how
/// many of the configured keys must accept it.
pub fn verify_oracle_signature(config: &OracleConfig, message: &[u8], signature_hex: &str) -> bool {
    let valid_count = config
        .pubkeys
        .iter()
        .filter(|pk| verify_ed25519_hex(pk, message, signature_hex))
        .count();
    valid_count as u32 >= config.threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::ValidatorKeyPair;
    use argh_core::protocol::OracleConfig;

    #[test]
    fn threshold_one_accepts_a_single_matching_key() {
        let kp = ValidatorKeyPair::generate();
        let sig = kp.sign(b"payload");
        let config = OracleConfig {
            pubkeys: vec![hex::encode(kp.public_key.as_bytes())],
            threshold: 1,
        };
        assert!(verify_oracle_signature(
            &config,
            b"payload",
            &hex::encode(sig.to_bytes())
        ));
    }

    #[test]
    fn rejects_when_no_key_matches() {
        let kp = ValidatorKeyPair::generate();
        let other = ValidatorKeyPair::generate();
        let sig = kp.sign(b"payload");
        let config = OracleConfig {
            pubkeys: vec![hex::encode(other.public_key.as_bytes())],
            threshold: 1,
        };
        assert!(!verify_oracle_signature(
            &config,
            b"payload",
            &hex::encode(sig.to_bytes())
        ));
    }
}
