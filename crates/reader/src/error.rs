//! Reader Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, following the same layout as every other lectio crate.
//!
//! Note what is *not* here: storage tier failures (recovered inside the
//! chain) and chapter/verse not-found conditions (expressed as
//! [`Lookup::NotFound`](crate::Lookup) values, because an empty chapter is a
//! legitimate state for some versions, not an error).

use derive_more::{Display, Error};
use lectio_canon::error::{Error as CanonError, ErrorKind as CanonErrorKind};
use lectio_upstream::error::{Error as UpstreamError, ErrorKind as UpstreamErrorKind};

/// A reader error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for reader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The book reference was rejected before any network call was made.
    #[display("unknown book: {_0}")]
    UnknownBook(#[error(not(source))] String),
    /// The upstream fetch failed; carries status and truncated body so a
    /// misconfigured API key (usually a 403) is distinguishable from an
    /// outage.
    #[display("upstream error: {_0}")]
    Upstream(UpstreamErrorKind),
    /// The reader cannot be constructed from the given configuration.
    #[display("misconfigured: {_0}")]
    Misconfigured(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Wrap an upstream error, preserving its `Exn` frame as a child in the
    /// error tree.
    #[track_caller]
    pub fn upstream(err: UpstreamError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Upstream(inner))
    }

    /// Wrap a canon (book validation) error.
    #[track_caller]
    pub fn book(err: CanonError) -> Error {
        let name = match &*err {
            CanonErrorKind::UnknownBook(name) | CanonErrorKind::InvalidBookCode(name) => name.clone(),
        };
        err.raise(ErrorKind::UnknownBook(name))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(inner) => inner.is_retryable(),
            Self::UnknownBook(_) | Self::Misconfigured(_) => false,
        }
    }
}
