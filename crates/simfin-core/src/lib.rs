pub mod error;
pub mod numeric;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "distributions")]
pub mod distributions;

pub use error::SimFinError;
pub use types::*;

/// Standard result type for all simfin operations
pub type SimFinResult<T> = Result<T, SimFinError>;
