//! Validator set configuration, loaded from `nodes.json` (§6
//! "configuration interface"). Every entry names one validator's network
//! address and Ed25519 pubkey; the node's own entry (matched by `id`) is
//! skipped when dialing peers.

use std::path::Path;

use argh_core::Address;
use serde::{Deserialize, Serialize};

use crate::error::NodeError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub id: Address,
    pub host: String,
    pub port: u16,
    /// Hex-encoded Ed25519 public key.
    pub pubkey: String,
}

impl ValidatorEntry {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Loads the validator set from `path`. Every entry is required to be a
/// validator address + reachable TCP address + pubkey triple — there is no
/// partial/optional form.
pub fn load_validators(path: impl AsRef<Path>) -> Result<Vec<ValidatorEntry>, NodeError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<ValidatorEntry> = serde_json::from_str(&raw)?;
    if entries.is_empty() {
        return Err(NodeError::Config(format!(
            "{} names no validators",
            path.display()
        )));
    }
    Ok(entries)
}
