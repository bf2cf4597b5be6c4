pub mod config;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "lifecycle")]
pub mod lifecycle;

pub use config::EngineConfig;
pub use error::{ContractError, ErrorKind};
pub use types::*;

/// Standard result type for all credit-contract operations
pub type ContractResult<T> = Result<T, ContractError>;
