//! Node-key management for the encrypted data directory (§6). The block
//! chain's own `chain.enc` is read/written by `argh-consensus`, which owns
//! the `Block`/`Chain` types; this module owns only what's generic across
//! every encrypted file in the data directory: loading or generating
//! `node.key`. Grounded on `core/storage.py::CryptoStore`.

use std::path::Path;

use argh_crypto::NodeKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("node.key has {0} bytes, expected 32")]
    BadLength(usize),
}

/// Loads `node.key` from `path`, generating and persisting a fresh random
/// key if the file doesn't exist yet — the reference implementation's
/// first-run behavior.
pub fn load_or_generate_node_key(path: impl AsRef<Path>) -> Result<NodeKey, KeyFileError> {
    let path = path.as_ref();
    if path.exists() {
        let bytes = std::fs::read(path)?;
        if bytes.len() != 32 {
            return Err(KeyFileError::BadLength(bytes.len()));
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(NodeKey::from_bytes(arr))
    } else {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let key = NodeKey::generate();
        std::fs::write(path, key.as_bytes())?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_once_then_reloads_identical_key() {
        let path = std::env::temp_dir().join("argh_state_test_node.key");
        let _ = std::fs::remove_file(&path);
        let a = load_or_generate_node_key(&path).unwrap();
        let b = load_or_generate_node_key(&path).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        let _ = std::fs::remove_file(&path);
    }
}
