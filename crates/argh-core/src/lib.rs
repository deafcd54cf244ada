pub mod codec;
pub mod constants;
pub mod decimal;
pub mod error;
pub mod protocol;
pub mod transaction;
pub mod types;

pub use codec::*;
pub use constants::*;
pub use decimal::parse_scaled;
pub use error::CoreError;
pub use protocol::{FeeDistribution, OracleConfig, Protocol};
pub use transaction::*;
pub use types::*;
