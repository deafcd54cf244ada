//! Node library surface: wires together `argh-core`/`argh-crypto`/
//! `argh-state`/`argh-consensus`/`argh-p2p`/`argh-genesis` into a runnable
//! validator process. The binary (`src/main.rs`) is a thin driver over
//! this; [`NodeHandle`] is what an embedder or test links against instead
//! of an RPC client.

pub mod config;
pub mod error;
pub mod handle;
pub mod oracle;
pub mod slot;

pub use config::{load_validators, ValidatorEntry};
pub use error::NodeError;
pub use handle::NodeHandle;
pub use oracle::{fetch_observation, OracleObservation};
pub use slot::{assemble_block, AssembledBlock};
