//! Ordered cache tiers for canonical scripture records.
//!
//! Reads walk the tiers strictly in order (process memory, then a durable
//! client-local store, then a shared durable store) and a hit at a slower
//! tier is back-filled into every faster tier. No tier is the source of
//! truth: anything here can be rebuilt from the upstream text API, so a tier
//! whose storage medium is unavailable degrades to a skipped tier rather
//! than an error.
//!
//! # Staleness
//! Every stored entry carries the unix timestamp it was written at and the
//! schema version it was written under. An entry is served only if the
//! schema version matches the running one AND its age is below the per-kind
//! TTL; anything else is a miss, which is how the design survives changes to
//! the canonical record shape without manual cache purges.

mod chain;
mod entry;
pub mod error;
mod local;
mod memory;
mod shared;
mod tier;

pub use crate::chain::TierChain;
pub use crate::entry::{Envelope, SCHEMA_VERSION, TtlPolicy};
pub use crate::local::LocalTier;
pub use crate::memory::MemoryTier;
pub use crate::shared::{Database, SharedTier};
pub use crate::tier::{CacheTier, Scope, TierHandle};
