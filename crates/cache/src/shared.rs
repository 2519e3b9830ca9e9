//! Shared durable cache tier backed by SQLite.
//!
//! This is the one tier visible across processes: a document store addressed
//! by collection name + sanitized key, each document holding
//! `{ data, timestamp, version }`. A write is a single atomic upsert, so
//! partial writes are never observable by concurrent readers.

use std::path::Path;

use async_trait::async_trait;
use exn::ResultExt;
use lectio_canon::DerivedKey;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use tracing::instrument;

use crate::entry::Envelope;
use crate::error::{ErrorKind, Result};
use crate::tier::{CacheTier, Scope, sanitize_key};

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
const MAX_CONNECTIONS: u32 = 5;

/// Connection pool for the shared document store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Connect to the document store at the given path.
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let options = Self::base_options().filename(path.as_ref()).create_if_missing(true);
        Self::new(options, None).await
    }

    /// Connect to an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // In-memory database must either use the same cache `.shared_cache(true)`,
        // or be limited to one connection. Otherwise parallel connections will
        // see different databases that contain different data.
        Self::new(options, Some(1)).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // WAL mode for better concurrent read performance.
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Several processes may share this store; don't error out the
            // moment two of them write concurrently.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    #[instrument("performing database migrations")]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    data: String,
    timestamp: i64,
    version: String,
}
impl TryFrom<DocumentRow> for Envelope {
    type Error = crate::error::Error;
    fn try_from(row: DocumentRow) -> Result<Self> {
        Ok(Self {
            data: serde_json::from_str(&row.data).or_raise(|| ErrorKind::InvalidData("document"))?,
            timestamp: row.timestamp,
            version: row.version,
        })
    }
}

/// The shared durable tier.
///
/// Deliberately spared by process-local clears: other processes may still be
/// reading the documents it holds.
pub struct SharedTier {
    name: String,
    pool: SqlitePool,
    collection: String,
}

impl SharedTier {
    pub fn new(db: &Database, collection: impl Into<String>) -> Self {
        Self { name: "shared".to_string(), pool: db.pool().clone(), collection: collection.into() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl CacheTier for SharedTier {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> Scope {
        Scope::Shared
    }

    async fn get(&self, key: &DerivedKey) -> Result<Option<Envelope>> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT data, timestamp, version FROM documents WHERE collection = ? AND key = ?")
                .bind(&self.collection)
                .bind(sanitize_key(key))
                .fetch_optional(&self.pool)
                .await
                .map_err(|err| exn::Exn::from(ErrorKind::Unavailable(format!("{}: {err}", self.name))))?;
        match row {
            None => Ok(None),
            // A row that no longer decodes is a miss; it'll be overwritten.
            Some(row) => Ok(Envelope::try_from(row).ok()),
        }
    }

    async fn put(&self, key: &DerivedKey, envelope: &Envelope) -> Result<()> {
        let data = serde_json::to_string(&envelope.data).or_raise(|| ErrorKind::InvalidData("document"))?;
        sqlx::query(
            "INSERT INTO documents (collection, key, data, timestamp, version) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (collection, key) DO UPDATE \
             SET data = excluded.data, timestamp = excluded.timestamp, version = excluded.version",
        )
        .bind(&self.collection)
        .bind(sanitize_key(key))
        .bind(data)
        .bind(envelope.timestamp)
        .bind(&envelope.version)
        .execute(&self.pool)
        .await
        .map_err(|err| exn::Exn::from(ErrorKind::Unavailable(format!("{}: {err}", self.name))))?;
        Ok(())
    }

    /// Drop this collection's documents.
    ///
    /// Never called by a chain-level clear (the chain skips shared tiers);
    /// exists for deliberate administrative wipes.
    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = ?")
            .bind(&self.collection)
            .execute(&self.pool)
            .await
            .map_err(|err| exn::Exn::from(ErrorKind::Unavailable(format!("{}: {err}", self.name))))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectio_canon::{Kind, derive_key};

    fn books_key(version: &str) -> DerivedKey {
        derive_key(Kind::Books, version, None, None, None)
    }

    #[tokio::test]
    async fn test_connect_in_memory_and_migrate() {
        let db = Database::connect_in_memory().await.unwrap();
        assert!(!db.pool().is_closed());
        db.close().await;
    }

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let db = Database::connect_in_memory().await.unwrap();
        let tier = SharedTier::new(&db, "texts");
        let key = books_key("kjv");
        assert!(tier.get(&key).await.unwrap().is_none());

        tier.put(&key, &Envelope::new(&1u32).unwrap()).await.unwrap();
        tier.put(&key, &Envelope::new(&2u32).unwrap()).await.unwrap();
        let read = tier.get(&key).await.unwrap().unwrap();
        assert_eq!(read.payload::<u32>().unwrap(), 2);
        assert_eq!(read.version, crate::SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let db = Database::connect_in_memory().await.unwrap();
        let texts = SharedTier::new(&db, "texts");
        let notes = SharedTier::new(&db, "notes");
        let key = books_key("kjv");

        texts.put(&key, &Envelope::new(&1u32).unwrap()).await.unwrap();
        assert!(notes.get(&key).await.unwrap().is_none());

        texts.clear().await.unwrap();
        assert!(texts.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let db = Database::connect_in_memory().await.unwrap();
        let tier = SharedTier::new(&db, "texts");
        db.close().await;
        let err = tier.get(&books_key("kjv")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unavailable(_)));
    }
}
