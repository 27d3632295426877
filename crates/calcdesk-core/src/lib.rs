pub mod error;
pub mod solvers;
pub mod time_value;
pub mod types;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "depreciation")]
pub mod depreciation;

#[cfg(feature = "stats")]
pub mod stats;

#[cfg(feature = "retirement")]
pub mod retirement;

#[cfg(feature = "fitness")]
pub mod fitness;

pub use error::CalcError;
pub use types::*;

/// Standard result type for all calculator operations
pub type CalcResult<T> = Result<T, CalcError>;
