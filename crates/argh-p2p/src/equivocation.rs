//! Tracks one block hash per `(producer, slot)` so a second, differently
//! hashed block from the same producer in the same slot can be detected and
//! rejected (§4.7 "same-slot fork tie-break", §8 scenario 7). Grounded on
//! `core/network.py`'s seen-block bookkeeping.

use std::collections::HashMap;

use argh_core::{Address, EQUIVOCATION_PRUNE_DEPTH};

#[derive(Default)]
pub struct EquivocationRegistry {
    seen: HashMap<(Address, u64), String>,
}

impl EquivocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `hash` as the block seen from `producer` at `slot`. Returns
    /// `Some(prior_hash)` if a different hash was already recorded for the
    /// same `(producer, slot)` pair — the caller should treat this as
    /// equivocation. A repeat of the same hash is not an equivocation.
    pub fn observe(&mut self, producer: Address, slot: u64, hash: &str) -> Option<String> {
        match self.seen.get(&(producer, slot)) {
            Some(prior) if prior != hash => Some(prior.clone()),
            Some(_) => None,
            None => {
                self.seen.insert((producer, slot), hash.to_string());
                None
            }
        }
    }

    /// Drops every entry more than [`EQUIVOCATION_PRUNE_DEPTH`] slots behind
    /// `current_slot`, bounding memory as the chain advances.
    pub fn prune(&mut self, current_slot: u64) {
        let cutoff = current_slot.saturating_sub(EQUIVOCATION_PRUNE_DEPTH);
        self.seen.retain(|(_, slot), _| *slot >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn second_distinct_hash_for_same_producer_and_slot_is_flagged() {
        let mut reg = EquivocationRegistry::new();
        assert!(reg.observe(addr(1), 5, "aaa").is_none());
        let prior = reg.observe(addr(1), 5, "bbb");
        assert_eq!(prior.as_deref(), Some("aaa"));
    }

    #[test]
    fn repeating_the_same_hash_is_not_equivocation() {
        let mut reg = EquivocationRegistry::new();
        assert!(reg.observe(addr(1), 5, "aaa").is_none());
        assert!(reg.observe(addr(1), 5, "aaa").is_none());
    }

    #[test]
    fn prune_drops_entries_older_than_the_configured_depth() {
        let mut reg = EquivocationRegistry::new();
        reg.observe(addr(1), 1, "aaa");
        reg.observe(addr(1), 5_000, "bbb");
        reg.prune(5_000);
        assert_eq!(reg.len(), 1);
    }
}
