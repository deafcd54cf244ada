//! Transaction validation/application, balances, fees, nonces, and the
//! encrypted mempool and node-key file (§3, §4.3, §6).

pub mod balances;
pub mod engine;
pub mod error;
pub mod fee;
pub mod mempool;
pub mod nonce;
pub mod persistence;

pub use balances::{BalanceKeyAddr, Balances};
pub use engine::{apply, validate};
pub use error::TxEngineError;
pub use fee::{calculate_fee, FeeBreakdown};
pub use mempool::{Mempool, MempoolError};
pub use nonce::{compute_nonces, expected_nonce};
pub use persistence::{load_or_generate_node_key, KeyFileError};
