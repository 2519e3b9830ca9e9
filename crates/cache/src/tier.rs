//! The cache tier trait.

use std::sync::Arc;

use async_trait::async_trait;
use lectio_canon::DerivedKey;

use crate::entry::Envelope;
use crate::error::Result;

/// Visibility of a cached value.
///
/// A `Private` read or write skips tiers whose [`CacheTier::scope`] is
/// `Shared`, so call sites handling per-session content never leak it into
/// the cross-process store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Private,
    Shared,
}

pub type TierHandle = Arc<dyn CacheTier>;

/// One storage layer in the cache hierarchy.
///
/// Implementations store [`Envelope`]s verbatim and know nothing about TTLs
/// or schema versions; staleness is judged by [`TierChain`](crate::TierChain)
/// at read time. A tier whose medium is inaccessible returns
/// [`Unavailable`](crate::error::ErrorKind::Unavailable) and the chain moves
/// on to the next tier.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Name of the tier, used for logging only.
    fn name(&self) -> &str;

    /// Whether this tier is visible across processes/sessions.
    fn scope(&self) -> Scope;

    /// Fetch the stored envelope for a key, `None` on a miss.
    async fn get(&self, key: &DerivedKey) -> Result<Option<Envelope>>;

    /// Store an envelope, overwriting any existing entry for the key.
    async fn put(&self, key: &DerivedKey, envelope: &Envelope) -> Result<()>;

    /// Drop every entry held by this tier.
    async fn clear(&self) -> Result<()>;
}

/// Flatten a derived key into a single path-safe token.
///
/// Key components are already restricted to `[a-z0-9.-]`, so mapping the `/`
/// separator to `_` keeps distinct keys distinct while producing a string
/// usable as a filename or document id.
pub(crate) fn sanitize_key(key: &DerivedKey) -> String {
    key.as_str().replace('/', "_")
}
