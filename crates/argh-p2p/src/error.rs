use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("payload of {0} bytes exceeds the maximum frame size")]
    PayloadTooLarge(usize),

    #[error("peer sent an unexpected message for the current state")]
    UnexpectedMessage,

    #[error("peer handshake did not arrive before the first message")]
    NoHandshake,

    #[error("write to peer timed out")]
    WriteTimeout,

    #[error("block validation failed: {0}")]
    BlockRejected(#[from] argh_consensus::BlockValidationError),
}
