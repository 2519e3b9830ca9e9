//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as every other lectio crate.
//!
//! Tier errors almost never escape this crate: [`TierChain`](crate::TierChain)
//! recovers an unavailable tier by skipping it and logging a warning.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The tier's storage medium is inaccessible (unwritable directory,
    /// closed database, ...). The chain skips the tier and carries on.
    #[display("cache tier unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// Database error on the shared tier.
    #[display("database error")]
    Database,
    /// Database migration error.
    #[display("database migration error")]
    Migration,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Database)
    }
}
