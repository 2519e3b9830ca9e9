//! The ordered tier chain.
//!
//! `get` walks the tiers strictly in order and treats anything stale,
//! undecodable or unavailable as a miss at that tier; a hit at tier *k* is
//! back-filled into tiers *1..k* so the next read is served from the fastest
//! tier. `put` writes every in-scope tier. Neither ever surfaces a tier
//! failure to the caller; the tiers are an optimisation, not a dependency.

use lectio_canon::{DerivedKey, Kind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::UtcDateTime;
use tracing::{debug, warn};

use crate::entry::{Envelope, TtlPolicy};
use crate::tier::{Scope, TierHandle};

/// An ordered sequence of cache tiers, fastest first.
///
/// Owned by (or handed to) the orchestrator rather than living in a
/// module-level global, so every test can run against its own instance.
pub struct TierChain {
    tiers: Vec<TierHandle>,
    ttl: TtlPolicy,
}

impl TierChain {
    pub fn new(tiers: Vec<TierHandle>, ttl: TtlPolicy) -> Self {
        Self { tiers, ttl }
    }

    fn in_scope(tier: &TierHandle, scope: Scope) -> bool {
        scope == Scope::Shared || tier.scope() == Scope::Private
    }

    /// Read a value, trying each in-scope tier in order.
    ///
    /// A `Private` read never touches a shared tier. Stale entries (TTL
    /// expired, or written under another schema version) are misses; a tier
    /// error is logged and skipped. On a hit, every faster in-scope tier is
    /// back-filled with the original envelope (original timestamp included,
    /// so back-filling never extends an entry's life).
    pub async fn get<T: DeserializeOwned>(&self, key: &DerivedKey, kind: Kind, scope: Scope) -> Option<T> {
        let now = UtcDateTime::now();
        let ttl = self.ttl.for_kind(kind);
        for (index, tier) in self.tiers.iter().enumerate() {
            if !Self::in_scope(tier, scope) {
                continue;
            }
            let envelope = match tier.get(key).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(error) => {
                    warn!(tier = tier.name(), key = %key, %error, "cache tier failed, skipping");
                    continue;
                },
            };
            if !envelope.is_fresh(ttl, now) {
                debug!(tier = tier.name(), key = %key, "stale entry treated as miss");
                continue;
            }
            let Ok(value) = envelope.payload::<T>() else {
                warn!(tier = tier.name(), key = %key, "undecodable entry treated as miss");
                continue;
            };
            self.backfill(key, &envelope, index, scope).await;
            debug!(tier = tier.name(), key = %key, "cache hit");
            return Some(value);
        }
        debug!(key = %key, "cache miss");
        None
    }

    async fn backfill(&self, key: &DerivedKey, envelope: &Envelope, hit_index: usize, scope: Scope) {
        for tier in &self.tiers[..hit_index] {
            if !Self::in_scope(tier, scope) {
                continue;
            }
            if let Err(error) = tier.put(key, envelope).await {
                warn!(tier = tier.name(), key = %key, %error, "back-fill failed");
            }
        }
    }

    /// Write a value into every in-scope tier, stamped with the current time
    /// and schema version.
    pub async fn put<T: Serialize>(&self, key: &DerivedKey, value: &T, scope: Scope) {
        let envelope = match Envelope::new(value) {
            Ok(envelope) => envelope,
            Err(error) => {
                // Our own canonical types serialize; reaching this means a bug,
                // but a cache write is never worth failing the request over.
                warn!(key = %key, %error, "value not serializable, not cached");
                return;
            },
        };
        for tier in &self.tiers {
            if !Self::in_scope(tier, scope) {
                continue;
            }
            if let Err(error) = tier.put(key, &envelope).await {
                warn!(tier = tier.name(), key = %key, %error, "cache write failed, skipping tier");
            }
        }
    }

    /// Wipe the process-local tiers.
    ///
    /// Shared tiers are deliberately spared: they may be serving other
    /// processes, and their entries expire by TTL anyway.
    pub async fn clear(&self) {
        for tier in &self.tiers {
            if tier.scope() == Scope::Shared {
                continue;
            }
            if let Err(error) = tier.clear().await {
                warn!(tier = tier.name(), %error, "cache clear failed, skipping tier");
            }
        }
    }
}
