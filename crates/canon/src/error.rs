//! Canon Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as every other lectio crate.

use derive_more::{Display, Error};

/// A canon error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for canon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A book reference did not match any entry in the 66-book canon table.
    /// Rejected before any network call is made.
    #[display("unknown book: {_0}")]
    UnknownBook(#[error(not(source))] String),
    /// A string claiming to be a canonical book code is not three ASCII
    /// alphanumerics.
    #[display("invalid book code: {_0}")]
    InvalidBookCode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Lookups against static tables either match or they don't.
        false
    }
}
