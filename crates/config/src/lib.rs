//! Configuration loading and validation.
//!
//! Sources are merged in precedence order: built-in defaults, then an
//! optional TOML file, then `LECTIO_*` environment variables (`__` nests,
//! e.g. `LECTIO_API__KEY`). The API key only ever lives here and in the
//! request header; it is never logged and never cached.

pub mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "LECTIO_";
const SHARED_DB_FILENAME: &str = "shared.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Root of the upstream text API.
    pub base_url: String,
    /// Upstream API key. Empty by default; required before any fetcher is
    /// built from this config.
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory for the client-local durable tier. Defaults to the
    /// platform cache directory.
    pub dir: Option<PathBuf>,
    /// Path of the shared SQLite store. Defaults to a file inside `dir`.
    pub db: Option<PathBuf>,
    /// TTL for verse/chapter text, in seconds.
    pub text_ttl_secs: u64,
    /// TTL for book/version metadata, in seconds.
    pub meta_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.scripture.api.bible/v1".to_string(),
                key: String::new(),
            },
            cache: CacheConfig {
                dir: None,
                db: None,
                text_ttl_secs: 3_600,
                meta_ttl_secs: 604_800,
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file, and the
    /// environment, then validate the result.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            debug!(file = %file.display(), "merging configuration file");
            figment = figment.merge(Toml::file(file));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("api.base_url must not be empty"));
        }
        if self.cache.text_ttl_secs == 0 || self.cache.meta_ttl_secs == 0 {
            exn::bail!(ErrorKind::Invalid("cache TTLs must be positive"));
        }
        Ok(())
    }

    /// Resolved directory for the client-local tier.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("", "", "lectio")
            .ok_or_else(|| exn::Exn::from(ErrorKind::Invalid("no home directory to place the cache in")))?;
        Ok(dirs.cache_dir().to_path_buf())
    }

    /// Resolved path of the shared SQLite store.
    pub fn shared_db_path(&self) -> Result<PathBuf> {
        match &self.cache.db {
            Some(db) => Ok(db.clone()),
            None => Ok(self.cache_dir()?.join(SHARED_DB_FILENAME)),
        }
    }
}
