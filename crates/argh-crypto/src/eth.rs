//! Ethereum-style `personal_sign` signing and recovery for user transactions.
//! Deliberately a different scheme from the raw Ed25519 used for validator
//! and oracle signatures (§9 open question) — they are not interchangeable.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha3::{Digest, Keccak256};

use argh_core::{Address, EthSignature};

/// Prepends the `personal_sign` prefix (`\x19Ethereum Signed Message:\n<len>`)
/// and hashes with Keccak256, producing the digest that is actually signed.
fn personal_sign_digest(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    let digest = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&digest);
    arr
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&digest);
    arr
}

/// Derives a user wallet address from an uncompressed secp256k1 public key
/// (65 bytes, `0x04` prefix): `"0x" + lower_hex(Keccak256(pubkey[1..])[-20:])`.
pub fn eth_address_from_uncompressed_pubkey(pubkey_uncompressed: &[u8]) -> Address {
    // Drop the leading 0x04 tag before hashing, matching Ethereum's scheme.
    let body = if pubkey_uncompressed.len() == 65 {
        &pubkey_uncompressed[1..]
    } else {
        pubkey_uncompressed
    };
    let digest = keccak256(body);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from_bytes(bytes)
}

pub struct EthKeyPair {
    pub address: Address,
    signing_key: SigningKey,
}

impl EthKeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Restores a keypair from a raw 32-byte secp256k1 scalar, as persisted
    /// to a wallet keyfile.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let signing_key = SigningKey::from_bytes(bytes.into()).ok()?;
        Some(Self::from_signing_key(signing_key))
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = VerifyingKey::from(&signing_key);
        let encoded = verifying_key.to_encoded_point(false);
        let address = eth_address_from_uncompressed_pubkey(encoded.as_bytes());
        Self {
            address,
            signing_key,
        }
    }

    /// Signs `message` using the `personal_sign` convention, returning a
    /// 65-byte recoverable signature (`r || s || v`), `v ∈ {0,1}`.
    pub fn personal_sign(&self, message: &[u8]) -> EthSignature {
        let digest = personal_sign_digest(message);
        let (signature, recid): (Signature, RecoveryId) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .expect("signing with a valid key over a fixed-size digest is infallible");
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recid.to_byte();
        EthSignature(bytes)
    }
}

/// Recovers the signer address from a `personal_sign` message + signature.
/// Returns `None` on any malformed input rather than panicking — signature
/// recovery runs on attacker-controlled mempool data.
pub fn recover_personal_sign(message: &[u8], signature: &EthSignature) -> Option<Address> {
    let digest = personal_sign_digest(message);
    let sig = Signature::from_slice(&signature.0[..64]).ok()?;
    let recid = RecoveryId::from_byte(signature.0[64])?;
    let verifying_key = VerifyingKey::recover_from_prehash(&digest, &sig, recid).ok()?;
    let encoded = verifying_key.to_encoded_point(false);
    Some(eth_address_from_uncompressed_pubkey(encoded.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personal_sign_recovers_signer_address() {
        let kp = EthKeyPair::generate();
        let sig = kp.personal_sign(b"{\"action\":\"transfer\"}");
        let recovered = recover_personal_sign(b"{\"action\":\"transfer\"}", &sig).unwrap();
        assert_eq!(recovered, kp.address);
    }

    #[test]
    fn tampered_message_does_not_recover_same_address() {
        let kp = EthKeyPair::generate();
        let sig = kp.personal_sign(b"original");
        let recovered = recover_personal_sign(b"tampered", &sig).unwrap();
        assert_ne!(recovered, kp.address);
    }
}
