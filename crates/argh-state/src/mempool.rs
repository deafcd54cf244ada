//! Encrypted-at-rest mempool (§6 `mempool.enc`), grounded on
//! `core/mempool.py::Mempool`. The original persists the whole pending-tx
//! list as a single AEAD blob on every mutation; this keeps that semantics
//! (atomic read-modify-write of the whole file) rather than incremental
//! per-tx storage, since the reference deployment's memory footprint at
//! mempool scale makes that the simpler and sufficiently fast choice.

use std::path::{Path, PathBuf};

use argh_core::{Transaction, TxId};
use argh_crypto::{decrypt, encrypt, AeadError, NodeKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MempoolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("decryption failed: {0}")]
    Aead(#[from] AeadError),
}

/// On-disk mempool backed by a single ChaCha20-Poly1305-encrypted JSON file.
pub struct Mempool {
    path: PathBuf,
}

impl Mempool {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates an empty encrypted mempool file if none exists yet.
    pub fn ensure_initialized(&self, key: &NodeKey) -> Result<(), MempoolError> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.save(key, &[])?;
        }
        Ok(())
    }

    pub fn load(&self, key: &NodeKey) -> Result<Vec<Transaction>, MempoolError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read(&self.path)?;
        let plaintext = decrypt(key, &raw)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn save(&self, key: &NodeKey, txs: &[Transaction]) -> Result<(), MempoolError> {
        let plaintext = serde_json::to_vec(txs)?;
        let ciphertext = encrypt(key, &plaintext);
        std::fs::write(&self.path, ciphertext)?;
        Ok(())
    }

    /// Adds `tx` unless a transaction with the same `txid` is already
    /// present. Returns `false` on a duplicate, mirroring the original's
    /// silent-reject-with-log behavior (logged by the caller, not here).
    pub fn add(&self, key: &NodeKey, tx: Transaction) -> Result<bool, MempoolError> {
        let mut txs = self.load(key)?;
        if txs.iter().any(|t| t.txid == tx.txid) {
            return Ok(false);
        }
        txs.push(tx);
        self.save(key, &txs)?;
        Ok(true)
    }

    /// Removes every transaction whose `txid` is in `txids` (included in a
    /// block, or invalidated against spendable balances).
    pub fn remove_many(&self, key: &NodeKey, txids: &[TxId]) -> Result<(), MempoolError> {
        let mut txs = self.load(key)?;
        txs.retain(|t| !txids.contains(&t.txid));
        self.save(key, &txs)
    }

    /// Drains and clears the mempool file, returning its prior contents.
    pub fn flush(&self, key: &NodeKey) -> Result<Vec<Transaction>, MempoolError> {
        let txs = self.load(key)?;
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(txs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{compute_txid, Action, Address, Amount, Asset};

    fn sample_tx(nonce: u64) -> Transaction {
        let action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount: Amount::from_whole(1),
            to: Address::ZERO,
        };
        let txid = compute_txid(&action, nonce, 1);
        Transaction {
            txid,
            sender: Address::ZERO,
            action,
            nonce,
            chain_id: 1,
            timestamp: 0,
            signature: Some(argh_core::EthSignature([0u8; 65])),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("argh_mempool_test_{name}.enc"))
    }

    #[test]
    fn add_rejects_duplicate_txid() {
        let path = temp_path("dup");
        let _ = std::fs::remove_file(&path);
        let key = NodeKey::generate();
        let mempool = Mempool::new(&path);
        mempool.ensure_initialized(&key).unwrap();
        let tx = sample_tx(0);
        assert!(mempool.add(&key, tx.clone()).unwrap());
        assert!(!mempool.add(&key, tx).unwrap());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn remove_many_drops_only_named_txids() {
        let path = temp_path("remove");
        let _ = std::fs::remove_file(&path);
        let key = NodeKey::generate();
        let mempool = Mempool::new(&path);
        mempool.ensure_initialized(&key).unwrap();
        let tx0 = sample_tx(0);
        let tx1 = sample_tx(1);
        mempool.add(&key, tx0.clone()).unwrap();
        mempool.add(&key, tx1.clone()).unwrap();
        mempool.remove_many(&key, &[tx0.txid]).unwrap();
        let remaining = mempool.load(&key).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].txid, tx1.txid);
        let _ = std::fs::remove_file(&path);
    }
}
