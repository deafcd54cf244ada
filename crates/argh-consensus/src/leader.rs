//! Deterministic slot leader election (§4.6). Grounded on
//! `core/consensus.py::select_block_producer`.

use argh_core::{sha256_hex, Address};

/// Picks the validator with the lexicographically smallest
/// `SHA256(SHA256(prev_hash|slot|attempt)|validator)` hex score.
/// `validators` need not be pre-sorted; the result is independent of input
/// order since every candidate is scored independently.
///
/// # Panics
/// Panics if `validators` is empty — callers always have a non-empty
/// configured validator set, so an empty slice indicates a misconfiguration
/// bug upstream, not a runtime condition to recover from.
pub fn select_leader(validators: &[Address], prev_hash: &str, slot: u64, attempt: u64) -> Address {
    assert!(!validators.is_empty(), "validator set must not be empty");

    let seed = sha256_hex(format!("{prev_hash}|{slot}|{attempt}").as_bytes());

    validators
        .iter()
        .map(|v| {
            let score = sha256_hex(format!("{seed}|{}", v.to_hex()).as_bytes());
            (score, *v)
        })
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v)
        .expect("validators is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn is_deterministic_for_fixed_inputs() {
        let validators = vec![addr(1), addr(2), addr(3)];
        let a = select_leader(&validators, "deadbeef", 10, 0);
        let b = select_leader(&validators, "deadbeef", 10, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn returns_a_member_of_the_validator_set() {
        let validators = vec![addr(1), addr(2), addr(3)];
        let leader = select_leader(&validators, "deadbeef", 10, 0);
        assert!(validators.contains(&leader));
    }

    #[test]
    fn different_slots_can_pick_different_leaders() {
        let validators = vec![addr(1), addr(2), addr(3), addr(4), addr(5)];
        let leaders: std::collections::HashSet<_> = (0..20)
            .map(|slot| select_leader(&validators, "deadbeef", slot, 0))
            .collect();
        assert!(leaders.len() > 1, "expected rotation across slots");
    }
}
