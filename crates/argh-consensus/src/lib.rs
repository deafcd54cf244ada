//! Block structure, leader election, block validation, and fee/reward
//! aggregation (C5, C6's pure pieces, §4.5-§4.7).

pub mod block;
pub mod chain;
pub mod error;
pub mod leader;
pub mod reward;
pub mod validate;

pub use block::{genesis_producer, Block};
pub use chain::Chain;
pub use error::BlockValidationError;
pub use leader::select_leader;
pub use reward::aggregate_fee_rewards;
pub use validate::validate_block;
