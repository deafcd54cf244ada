use sha2::{Digest, Sha256};

/// `SHA256` of arbitrary bytes — the hash function used throughout the
/// protocol (block hashes, txids, commit preimages). Distinct from the
/// Keccak256 used only for Ethereum-style address/signature recovery.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&digest);
    arr
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Derives a validator/node address from an Ed25519 public key:
/// `"0x" + lower_hex(SHA256(pubkey)[-20:])`.
pub fn validator_address_from_pubkey(pubkey: &[u8]) -> argh_core::Address {
    let digest = sha256(pubkey);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    argh_core::Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_address_uses_last_20_bytes_of_sha256() {
        let pk = [7u8; 32];
        let addr = validator_address_from_pubkey(&pk);
        let digest = sha256(&pk);
        assert_eq!(addr.as_bytes(), &digest[12..]);
    }
}
