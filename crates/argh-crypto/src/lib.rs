pub mod aead;
pub mod eth;
pub mod hash;
pub mod keypair;
pub mod oracle;

pub use aead::{decrypt, encrypt, AeadError, NodeKey};
pub use eth::{eth_address_from_uncompressed_pubkey, recover_personal_sign, EthKeyPair};
pub use hash::{sha256, sha256_hex, validator_address_from_pubkey};
pub use keypair::{verify_ed25519_hex, ValidatorKeyPair, ValidatorPublicInfo};
pub use oracle::verify_oracle_signature;
