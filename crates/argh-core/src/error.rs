use thiserror::Error;

/// Errors surfaced by the canonical codec, amount arithmetic, and other
/// core primitives shared by every higher-level crate in the workspace.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid asset symbol: {0}")]
    InvalidAsset(String),

    #[error("amount overflow")]
    AmountOverflow,

    #[error("amount has more than 8 fractional digits: {0}")]
    AmountNotCanonical(String),

    #[error("invalid amount string: {0}")]
    InvalidAmount(String),

    #[error("invalid txid: {0}")]
    InvalidTxId(String),

    #[error("canonical encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
