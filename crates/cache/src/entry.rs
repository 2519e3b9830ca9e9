//! The stored form of a cache entry and the per-kind TTL policy.

use lectio_canon::Kind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::{Duration, UtcDateTime};

use crate::error::{ErrorKind, Result};

/// Version tag of the canonical record shape. Bump whenever a serialized
/// model changes incompatibly; every existing entry then reads as a miss.
pub const SCHEMA_VERSION: &str = "1";

/// What a tier actually stores: the payload as untyped JSON plus the
/// metadata needed to judge staleness at read time.
///
/// This matches the shared durable store's document shape
/// (`{ data, timestamp, version }`), so a document written by one process is
/// readable by any other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: serde_json::Value,
    /// Unix seconds at write time.
    pub timestamp: i64,
    /// Schema version at write time.
    pub version: String,
}

impl Envelope {
    /// Wrap a payload, stamped with the current time and schema version.
    pub fn new<T: Serialize>(payload: &T) -> Result<Self> {
        use exn::ResultExt;
        Ok(Self {
            data: serde_json::to_value(payload).or_raise(|| ErrorKind::InvalidData("payload"))?,
            timestamp: UtcDateTime::now().unix_timestamp(),
            version: SCHEMA_VERSION.to_string(),
        })
    }

    /// Construct with an explicit timestamp. Used by tests to back-date
    /// entries; staleness is always judged against wall-clock reads.
    pub fn written_at<T: Serialize>(payload: &T, timestamp: UtcDateTime) -> Result<Self> {
        Ok(Self { timestamp: timestamp.unix_timestamp(), ..Self::new(payload)? })
    }

    /// An entry is fresh iff its schema version matches the running one and
    /// its age is strictly below the TTL. Anything else is a miss.
    pub fn is_fresh(&self, ttl: Duration, now: UtcDateTime) -> bool {
        if self.version != SCHEMA_VERSION {
            return false;
        }
        let age = now.unix_timestamp() - self.timestamp;
        age < ttl.whole_seconds()
    }

    /// Decode the payload back into its typed form.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        use exn::ResultExt;
        serde_json::from_value(self.data.clone()).or_raise(|| ErrorKind::InvalidData("payload"))
    }
}

/// Per-kind time-to-live.
///
/// Verse and chapter text might be corrected upstream, so it expires on the
/// order of an hour; book/version metadata rarely changes and lives for a
/// week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub text: Duration,
    pub metadata: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self { text: Duration::hours(1), metadata: Duration::days(7) }
    }
}

impl TtlPolicy {
    pub fn for_kind(&self, kind: Kind) -> Duration {
        match kind {
            Kind::Books => self.metadata,
            Kind::Chapters | Kind::Verses | Kind::Verse => self.text,
        }
    }
}
