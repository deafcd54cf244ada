//! The node binary's top-level error type, composing every library crate's
//! error via `#[from]` (§7 "every variant maps to..., composed at the binary
//! boundary into one top-level error").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node key error: {0}")]
    KeyFile(#[from] argh_state::KeyFileError),

    #[error("mempool error: {0}")]
    Mempool(#[from] argh_state::MempoolError),

    #[error("decryption failed: {0}")]
    Aead(#[from] argh_crypto::AeadError),

    #[error("network error: {0}")]
    Network(#[from] argh_p2p::NetworkError),

    #[error("block validation failed: {0}")]
    BlockValidation(#[from] argh_consensus::BlockValidationError),

    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),
}
