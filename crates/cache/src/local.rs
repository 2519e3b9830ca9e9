//! Client-local durable cache tier.
//!
//! One JSON file per key under a configured directory, every filename
//! carrying a fixed `lectio.` prefix so [`clear`](CacheTier::clear) never
//! touches foreign files sharing the directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use exn::ResultExt;
use lectio_canon::DerivedKey;
use tokio::fs;

use crate::entry::Envelope;
use crate::error::{ErrorKind, Result};
use crate::tier::{CacheTier, Scope, sanitize_key};

const FILE_PREFIX: &str = "lectio.";

/// Durable tier on the local filesystem.
///
/// I/O failures (unwritable directory, sandboxed execution with no disk
/// access) surface as [`Unavailable`](ErrorKind::Unavailable); the chain
/// recovers by skipping this tier, so construction itself never fails.
pub struct LocalTier {
    name: String,
    root: PathBuf,
}

impl LocalTier {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { name: "local".to_string(), root: root.into() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn file_for(&self, key: &DerivedKey) -> PathBuf {
        self.root.join(format!("{FILE_PREFIX}{}.json", sanitize_key(key)))
    }

    fn unavailable(&self, err: std::io::Error) -> crate::error::Error {
        exn::Exn::from(ErrorKind::Unavailable(format!("{}: {err}", self.name)))
    }

    fn is_cache_file(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".json"))
    }
}

#[async_trait]
impl CacheTier for LocalTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        Scope::Private
    }

    async fn get(&self, key: &DerivedKey) -> Result<Option<Envelope>> {
        let path = self.file_for(key);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.unavailable(err)),
        };
        // A corrupt file is a miss, not an error; it'll be overwritten by the
        // next back-fill or read-through write.
        Ok(serde_json::from_slice(&raw).ok())
    }

    async fn put(&self, key: &DerivedKey, envelope: &Envelope) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|err| self.unavailable(err))?;
        let raw = serde_json::to_vec(envelope).or_raise(|| ErrorKind::InvalidData("envelope"))?;
        fs::write(self.file_for(key), raw).await.map_err(|err| self.unavailable(err))
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // Nothing was ever written; nothing to clear.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(self.unavailable(err)),
        };
        while let Some(entry) = entries.next_entry().await.map_err(|err| self.unavailable(err))? {
            let path = entry.path();
            if Self::is_cache_file(&path) {
                fs::remove_file(&path).await.map_err(|err| self.unavailable(err))?;
            }
        }
        Ok(())
    }
}
