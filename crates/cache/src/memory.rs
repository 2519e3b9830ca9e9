//! Process-memory cache tier.

use std::collections::HashMap;

use async_trait::async_trait;
use lectio_canon::DerivedKey;
use tokio::sync::RwLock;

use crate::entry::Envelope;
use crate::error::Result;
use crate::tier::{CacheTier, Scope};

/// The fastest tier: a `HashMap` behind a [`RwLock`], so all trait methods
/// operate on `&self` without external synchronisation. Lost on process
/// exit, which is fine: it only ever holds values rebuildable from the
/// slower tiers or upstream.
pub struct MemoryTier {
    name: String,
    entries: RwLock<HashMap<String, Envelope>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self { name: "memory".to_string(), entries: RwLock::new(HashMap::new()) }
    }

    /// Change the name of the tier (useful when a test chains several).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of entries currently held. Test observability.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        Scope::Private
    }

    async fn get(&self, key: &DerivedKey) -> Result<Option<Envelope>> {
        Ok(self.entries.read().await.get(key.as_str()).cloned())
    }

    async fn put(&self, key: &DerivedKey, envelope: &Envelope) -> Result<()> {
        self.entries.write().await.insert(key.as_str().to_string(), envelope.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_canon::{Kind, derive_key};

    fn key(version: &str) -> DerivedKey {
        derive_key(Kind::Books, version, None, None, None)
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let tier = MemoryTier::new();
        let key = key("kjv");
        assert!(tier.get(&key).await.unwrap().is_none());

        let first = Envelope::new(&1u32).unwrap();
        tier.put(&key, &first).await.unwrap();
        assert_eq!(tier.get(&key).await.unwrap().unwrap().payload::<u32>().unwrap(), 1);

        let second = Envelope::new(&2u32).unwrap();
        tier.put(&key, &second).await.unwrap();
        assert_eq!(tier.get(&key).await.unwrap().unwrap().payload::<u32>().unwrap(), 2);
        assert_eq!(tier.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let tier = MemoryTier::new();
        tier.put(&key("kjv"), &Envelope::new(&1u32).unwrap()).await.unwrap();
        tier.put(&key("asv"), &Envelope::new(&2u32).unwrap()).await.unwrap();
        tier.clear().await.unwrap();
        assert!(tier.is_empty().await);
    }
}
