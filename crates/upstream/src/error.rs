//! Upstream Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as every other lectio crate.

use derive_more::{Display, Error};

/// An upstream error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for upstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Both variants carry enough detail to tell a misconfigured API key
/// (commonly a 403) from a transient outage. Neither is ever cached.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure or non-2xx response. `status` is `None` when the
    /// request never produced a response; `body` is truncated and may be
    /// JSON or plain text, kept verbatim either way.
    #[display("upstream unavailable (status {}): {body}", status.map_or("none".to_string(), |s| s.to_string()))]
    Unavailable { status: Option<u16>, body: String },
    /// A 2xx response whose body is not parseable JSON.
    #[display("invalid upstream shape: {_0}")]
    InvalidShape(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            // No response at all, or a server-side failure: transient.
            Self::Unavailable { status: None, .. } => true,
            Self::Unavailable { status: Some(status), .. } => *status >= 500,
            // A 4xx (bad key, bad reference) won't fix itself.
            Self::InvalidShape(_) => false,
        }
    }
}
