use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use argh_core::Address;

use crate::hash::validator_address_from_pubkey;

/// A validator or oracle Ed25519 keypair. Used for block signatures and
/// oracle-observation signatures — never for user transactions, which sign
/// with the Ethereum `personal_sign` scheme instead (`EthKeyPair`).
pub struct ValidatorKeyPair {
    pub address: Address,
    pub public_key: VerifyingKey,
    signing_key: SigningKey,
}

impl ValidatorKeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = signing_key.verifying_key();
        let address = validator_address_from_pubkey(public_key.as_bytes());
        Self {
            address,
            public_key,
            signing_key,
        }
    }

    pub fn seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Signs `message` with raw Ed25519 — no prefix, unlike `personal_sign`.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl Drop for ValidatorKeyPair {
    fn drop(&mut self) {
        let mut seed = self.signing_key.to_bytes();
        seed.zeroize();
    }
}

impl std::fmt::Debug for ValidatorKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValidatorKeyPair {{ address: {:?} }}", self.address)
    }
}

/// Verifies a raw Ed25519 signature against a hex-encoded public key.
pub fn verify_ed25519_hex(pubkey_hex: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(pk_bytes) = hex::decode(pubkey_hex) else {
        return false;
    };
    let Ok(pk_arr) = <[u8; 32]>::try_from(pk_bytes.as_slice()) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pk_arr) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig_arr) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_arr);
    verifying_key.verify(message, &signature).is_ok()
}

/// Persisted (encrypted) form of a validator seed — `Serialize`/`Deserialize`
/// only cover the public half; the seed is handled separately so it never
/// accidentally round-trips through plaintext JSON.
#[derive(Serialize, Deserialize)]
pub struct ValidatorPublicInfo {
    pub address: Address,
    pub pubkey_hex: String,
}

impl From<&ValidatorKeyPair> for ValidatorPublicInfo {
    fn from(kp: &ValidatorKeyPair) -> Self {
        Self {
            address: kp.address,
            pubkey_hex: hex::encode(kp.public_key.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_round_trip() {
        let kp = ValidatorKeyPair::generate();
        let sig = kp.sign(b"hello");
        let pk_hex = hex::encode(kp.public_key.as_bytes());
        assert!(verify_ed25519_hex(&pk_hex, b"hello", &hex::encode(sig.to_bytes())));
        assert!(!verify_ed25519_hex(&pk_hex, b"goodbye", &hex::encode(sig.to_bytes())));
    }

    #[test]
    fn seed_round_trip_preserves_address() {
        let kp = ValidatorKeyPair::generate();
        let seed = kp.seed_bytes();
        let restored = ValidatorKeyPair::from_seed(&seed);
        assert_eq!(kp.address, restored.address);
    }
}
