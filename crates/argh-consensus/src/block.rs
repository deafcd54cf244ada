//! Block structure and hashing (§3 "Block", §4.5 step 2). Grounded on
//! `core/block.py::Block`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use argh_core::{consensus_form_value, sha256_hex, sorted_json, Address, Protocol, Transaction};

/// `"0x" + 40 zero hex digits` — the producer of the genesis block.
pub fn genesis_producer() -> Address {
    Address::ZERO
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub prev_hash: String,
    pub producer_id: Address,
    /// Hex-encoded Ed25519 signature over `hash.as_bytes()` (the hash's own
    /// ASCII hex representation, not the raw 32 bytes). `None` only for
    /// genesis.
    pub signature: Option<String>,
    pub slot: u64,
    pub transactions: Vec<Transaction>,
    pub flare_commit: Option<String>,
    /// Present only in the genesis block.
    pub protocol: Option<Protocol>,
    pub hash: String,
}

impl Block {
    /// Builds a block and computes its hash from the consensus-critical
    /// fields. `protocol` must be `Some` for index 0 and `None` otherwise.
    pub fn new(
        index: u64,
        prev_hash: String,
        producer_id: Address,
        slot: u64,
        transactions: Vec<Transaction>,
        flare_commit: Option<String>,
        protocol: Option<Protocol>,
    ) -> Self {
        let hash = compute_hash(
            index,
            &prev_hash,
            &producer_id,
            slot,
            &transactions,
            &flare_commit,
            protocol.as_ref(),
        );
        Self {
            index,
            prev_hash,
            producer_id,
            signature: None,
            slot,
            transactions,
            flare_commit,
            protocol,
            hash,
        }
    }

    /// Recomputes the hash from this block's fields — used by the validator
    /// to check `block.hash` wasn't tampered with in transit.
    pub fn recompute_hash(&self) -> String {
        compute_hash(
            self.index,
            &self.prev_hash,
            &self.producer_id,
            self.slot,
            &self.transactions,
            &self.flare_commit,
            self.protocol.as_ref(),
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }
}

fn compute_hash(
    index: u64,
    prev_hash: &str,
    producer_id: &Address,
    slot: u64,
    transactions: &[Transaction],
    flare_commit: &Option<String>,
    protocol: Option<&Protocol>,
) -> String {
    let consensus_txs: Vec<Value> = transactions.iter().map(consensus_form_value).collect();

    let mut map = Map::new();
    map.insert("index".into(), Value::Number(index.into()));
    map.insert("prev_hash".into(), Value::String(prev_hash.to_string()));
    map.insert("producer_id".into(), Value::String(producer_id.to_hex()));
    map.insert("slot".into(), Value::Number(slot.into()));
    map.insert("transactions".into(), Value::Array(consensus_txs));
    map.insert(
        "flare_commit".into(),
        match flare_commit {
            Some(c) => Value::String(c.clone()),
            None => Value::Null,
        },
    );
    if let Some(protocol) = protocol {
        map.insert(
            "protocol".into(),
            serde_json::to_value(protocol).expect("Protocol always serializes"),
        );
    }

    sha256_hex(sorted_json(&Value::Object(map)).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hash_is_stable_across_rebuilds() {
        let producer = genesis_producer();
        let b1 = Block::new(0, "0".repeat(64), producer, 0, vec![], None, None);
        let b2 = Block::new(0, "0".repeat(64), producer, 0, vec![], None, None);
        assert_eq!(b1.hash, b2.hash);
    }

    #[test]
    fn changing_slot_changes_hash() {
        let producer = genesis_producer();
        let b1 = Block::new(1, "a".repeat(64), producer, 5, vec![], None, None);
        let b2 = Block::new(1, "a".repeat(64), producer, 6, vec![], None, None);
        assert_ne!(b1.hash, b2.hash);
    }

    #[test]
    fn recompute_hash_matches_constructed_hash() {
        let producer = genesis_producer();
        let b = Block::new(1, "a".repeat(64), producer, 5, vec![], None, None);
        assert_eq!(b.recompute_hash(), b.hash);
    }
}
