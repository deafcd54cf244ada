//! At-rest encryption for `chain.enc` / `mempool.enc` / `validator.key`
//! (§6 External Interfaces). ChaCha20-Poly1305 with a random nonce prepended
//! to the ciphertext; the key itself lives in `node.key`, generated once on
//! first run.

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AeadError {
    #[error("ciphertext is shorter than the nonce")]
    Truncated,
    #[error("decryption failed (wrong key or corrupted data)")]
    DecryptionFailed,
}

pub struct NodeKey(Key);

impl NodeKey {
    pub fn generate() -> Self {
        Self(ChaCha20Poly1305::generate_key(&mut OsRng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Key::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_ref()
    }
}

/// Encrypts `plaintext`, returning `nonce || ciphertext`.
pub fn encrypt(key: &NodeKey, plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(&key.0);
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let mut ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .expect("encryption with a freshly generated nonce cannot fail");
    let mut out = nonce.to_vec();
    out.append(&mut ciphertext);
    out
}

/// Decrypts `nonce || ciphertext` produced by [`encrypt`].
pub fn decrypt(key: &NodeKey, data: &[u8]) -> Result<Vec<u8>, AeadError> {
    if data.len() < 12 {
        return Err(AeadError::Truncated);
    }
    let (nonce_bytes, ciphertext) = data.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = ChaCha20Poly1305::new(&key.0);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| AeadError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = NodeKey::generate();
        let ciphertext = encrypt(&key, b"hello world");
        let plaintext = decrypt(&key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello world");
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let key = NodeKey::generate();
        let other = NodeKey::generate();
        let ciphertext = encrypt(&key, b"hello world");
        assert!(decrypt(&other, &ciphertext).is_err());
    }
}
