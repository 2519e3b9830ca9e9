//! The read-through orchestrator.
//!
//! Given a logical request ("verses of Genesis 1 in KJV"), the [`Reader`]
//! resolves the version, derives the cache key, walks the tier chain, and on
//! a full miss fetches from upstream, normalizes, back-fills every tier and
//! returns the canonical records. Fetch failures are surfaced without
//! touching the cache; failures are never cached.
//!
//! Concurrent reads share no mutable state beyond the tiers themselves; the
//! worst case of two racing misses for the same key is a harmless duplicate
//! fetch and an idempotent duplicate write.

pub mod error;

use std::future::Future;
use std::sync::Arc;

use lectio_cache::{Database, LocalTier, MemoryTier, Scope, SharedTier, TierChain, TierHandle, TtlPolicy};
use lectio_canon::{Book, Chapter, DerivedKey, Kind, Verse, derive_book_code, derive_key, versions};
use lectio_config::Config;
use lectio_upstream::{HttpSource, SourceHandle, VerseContext, normalize};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{instrument, warn};

use crate::error::{ErrorKind, Result};

/// Collection name for canonical text documents in the shared store.
const TEXT_COLLECTION: &str = "texts";

/// The outcome of a lookup that may legitimately find nothing.
///
/// `NotFound` is a value, not an error: some versions genuinely lack a
/// requested chapter or verse, and callers branch on meaning rather than on
/// exception type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Façade over the tier chain and the upstream source.
///
/// Owns its [`TierChain`] explicitly (no module-level singleton), so every
/// test can run against an isolated instance.
pub struct Reader {
    chain: TierChain,
    source: SourceHandle,
}

impl Reader {
    pub fn new(chain: TierChain, source: SourceHandle) -> Self {
        Self { chain, source }
    }

    /// Wire up the default tier chain and HTTP source from configuration.
    ///
    /// A tier whose medium cannot be prepared (no cache directory, unopenable
    /// database) is dropped with a warning rather than failing construction;
    /// the chain degrades down to memory-only.
    pub async fn from_config(config: &Config) -> Result<Self> {
        if config.api.key.trim().is_empty() {
            exn::bail!(ErrorKind::Misconfigured("api.key is required"));
        }
        let source = HttpSource::new(&config.api.base_url, &config.api.key).map_err(ErrorKind::upstream)?;

        let mut tiers: Vec<TierHandle> = vec![Arc::new(MemoryTier::new())];
        match config.cache_dir() {
            Ok(dir) => tiers.push(Arc::new(LocalTier::new(dir))),
            Err(error) => warn!(%error, "local cache tier disabled"),
        }
        match config.shared_db_path() {
            Ok(path) => match Database::connect(&path).await {
                Ok(db) => tiers.push(Arc::new(SharedTier::new(&db, TEXT_COLLECTION))),
                Err(error) => warn!(%error, "shared cache tier disabled"),
            },
            Err(error) => warn!(%error, "shared cache tier disabled"),
        }

        let ttl = TtlPolicy {
            text: time::Duration::seconds(i64::try_from(config.cache.text_ttl_secs).unwrap_or(i64::MAX)),
            metadata: time::Duration::seconds(i64::try_from(config.cache.meta_ttl_secs).unwrap_or(i64::MAX)),
        };
        Ok(Self::new(TierChain::new(tiers, ttl), Arc::new(source)))
    }

    /// The read-through core: serve from the chain, otherwise await the
    /// fetch, cache its result in every in-scope tier, and return it.
    /// The fetch future is only awaited on a miss; its errors propagate
    /// without touching the cache.
    async fn read_through<T>(
        &self,
        key: &DerivedKey,
        kind: Kind,
        scope: Scope,
        fetch: impl Future<Output = Result<T>>,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(hit) = self.chain.get::<T>(key, kind, scope).await {
            return Ok(hit);
        }
        let value = fetch.await?;
        self.chain.put(key, &value, scope).await;
        Ok(value)
    }

    /// The canonical books available in a version, in canonical order.
    #[instrument(skip(self))]
    pub async fn books(&self, version: &str) -> Result<Vec<Book>> {
        let version = versions::resolve(version);
        let key = derive_key(Kind::Books, &version, None, None, None);
        self.read_through(&key, Kind::Books, Scope::Shared, async {
            let raw = self.source.books(&version).await.map_err(ErrorKind::upstream)?;
            Ok(normalize::normalize_books(&raw))
        })
        .await
    }

    /// The chapters of a book, sorted ascending. An empty list is a
    /// legitimate result, not an error.
    #[instrument(skip(self))]
    pub async fn chapters(&self, version: &str, book: &str) -> Result<Vec<Chapter>> {
        let version = versions::resolve(version);
        let book = derive_book_code(book).map_err(ErrorKind::book)?;
        let key = derive_key(Kind::Chapters, &version, Some(&book), None, None);
        self.read_through(&key, Kind::Chapters, Scope::Shared, async {
            let raw = self.source.chapters(&version, book.as_str()).await.map_err(ErrorKind::upstream)?;
            Ok(normalize::normalize_chapter_list(&raw))
        })
        .await
    }

    /// The verses of one chapter, summary first and then ascending.
    ///
    /// This is the one compound fetch: the owning chapter's upstream id is
    /// resolved through its own (cached) read-through first, and a chapter
    /// number absent from the normalized list short-circuits to `NotFound`
    /// without ever attempting the verse fetch.
    #[instrument(skip(self))]
    pub async fn verses(&self, version: &str, book: &str, chapter: u32) -> Result<Lookup<Vec<Verse>>> {
        let version = versions::resolve(version);
        let book = derive_book_code(book).map_err(ErrorKind::book)?;
        // Resolution is idempotent, so delegating to the cached chapter
        // lookup with the already-resolved version is safe.
        let chapters = self.chapters(&version, book.as_str()).await?;
        let Some(found) = chapters.iter().find(|c| c.number == chapter) else {
            return Ok(Lookup::NotFound);
        };

        let key = derive_key(Kind::Verses, &version, Some(&book), Some(chapter), None);
        let ctx = VerseContext { version: &version, book: &book, chapter };
        let verses = self
            .read_through(&key, Kind::Verses, Scope::Shared, async {
                let raw = self.source.verses(&version, &found.upstream_id).await.map_err(ErrorKind::upstream)?;
                Ok(normalize::normalize_verses(&raw, &ctx))
            })
            .await?;
        Ok(Lookup::Found(verses))
    }

    /// A single verse, addressed by number.
    #[instrument(skip(self))]
    pub async fn verse(&self, version: &str, book: &str, chapter: u32, verse: u32) -> Result<Lookup<Verse>> {
        let version = versions::resolve(version);
        let book = derive_book_code(book).map_err(ErrorKind::book)?;
        let key = derive_key(Kind::Verse, &version, Some(&book), Some(chapter), Some(verse));
        let ctx = VerseContext { version: &version, book: &book, chapter };
        let verse_id = format!("{book}.{chapter}.{verse}");
        let found: Option<Verse> = self
            .read_through(&key, Kind::Verse, Scope::Shared, async {
                let raw = self.source.verse(&version, &verse_id).await.map_err(ErrorKind::upstream)?;
                Ok(normalize::normalize_single_verse(&raw, &ctx))
            })
            .await?;
        Ok(match found {
            Some(verse) => Lookup::Found(verse),
            None => Lookup::NotFound,
        })
    }

    /// Verse counts for every chapter of a book, fetched concurrently.
    ///
    /// The per-chapter reads are independent read-throughs joined at the
    /// end; they share nothing but the cache tiers.
    #[instrument(skip(self))]
    pub async fn verse_counts(&self, version: &str, book: &str) -> Result<Vec<(u32, usize)>> {
        let chapters = self.chapters(version, book).await?;
        let lookups = futures::future::try_join_all(
            chapters.iter().map(|c| self.verses(version, book, c.number)),
        )
        .await?;
        Ok(chapters
            .iter()
            .zip(lookups)
            .map(|(chapter, lookup)| (chapter.number, lookup.found().map_or(0, |verses| verses.len())))
            .collect())
    }

    /// Wipe the process-local cache tiers. The shared durable tier is
    /// deliberately spared: it may be serving other processes.
    pub async fn clear_cache(&self) {
        self.chain.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lectio_canon::VerseNumber;
    use lectio_upstream::MockSource;
    use serde_json::{Value, json};

    use super::*;

    const KJV_ID: &str = "de4e12af7f28f599-02";

    fn genesis_fixtures() -> Vec<(String, Value)> {
        let verses: Vec<Value> = (1..=31)
            .map(|n| json!({ "id": format!("GEN.1.{n}"), "content": format!("<p>verse {n}</p>") }))
            .collect();
        vec![
            (
                format!("bibles/{KJV_ID}/books"),
                json!({ "data": [{ "id": "GEN", "name": "Genesis" }, { "id": "EXO", "name": "Exodus" }] }),
            ),
            (
                format!("bibles/{KJV_ID}/books/GEN/chapters"),
                json!({ "data": [
                    { "id": "GEN.intro", "number": "intro" },
                    { "id": "GEN.1", "number": "1" },
                    { "id": "GEN.2", "number": "2" },
                ]}),
            ),
            (
                format!("bibles/{KJV_ID}/chapters/GEN.1/verses"),
                json!({ "data": verses }),
            ),
            (
                format!("bibles/{KJV_ID}/chapters/GEN.2/verses"),
                json!({ "data": [{ "id": "GEN.2.1", "content": "one" }, { "id": "GEN.2.2", "content": "two" }] }),
            ),
        ]
    }

    fn reader_with(source: Arc<MockSource>) -> Reader {
        let chain = TierChain::new(vec![Arc::new(MemoryTier::new())], TtlPolicy::default());
        Reader::new(chain, source)
    }

    #[tokio::test]
    async fn test_cold_cache_end_to_end_then_fully_cached() {
        let source = Arc::new(MockSource::with_fixtures(genesis_fixtures()));
        let reader = reader_with(source.clone());

        // Cold cache: resolves "kjv", fetches chapters then verses.
        let verses = reader.verses("kjv", "GEN", 1).await.unwrap().found().unwrap();
        assert_eq!(verses.len(), 31);
        assert_eq!(verses.first().unwrap().number, VerseNumber::Number(1));
        assert_eq!(verses.last().unwrap().number, VerseNumber::Number(31));
        assert!(verses.iter().all(|v| v.number != VerseNumber::Summary));
        assert_eq!(verses[0].text, "verse 1");
        assert_eq!(source.calls(), 2);

        // Second identical call: same records, zero upstream calls.
        let again = reader.verses("kjv", "GEN", 1).await.unwrap().found().unwrap();
        assert_eq!(again, verses);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_chapter_short_circuits_before_verse_fetch() {
        let source = Arc::new(MockSource::with_fixtures(genesis_fixtures()));
        let reader = reader_with(source.clone());

        let lookup = reader.verses("kjv", "GEN", 99).await.unwrap();
        assert!(lookup.is_not_found());
        // Only the chapter list was requested; no verse fetch was attempted
        // with an invalid id.
        assert_eq!(source.requested_paths(), vec![format!("bibles/{KJV_ID}/books/GEN/chapters")]);
    }

    #[tokio::test]
    async fn test_unknown_book_rejected_before_any_network_call() {
        let source = Arc::new(MockSource::default());
        let reader = reader_with(source.clone());

        let err = reader.verses("kjv", "Book of Armaments", 1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownBook(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_and_is_not_cached() {
        let source = Arc::new(MockSource::default());
        let reader = reader_with(source.clone());

        for _ in 0..2 {
            let err = reader.books("kjv").await.unwrap_err();
            match &*err {
                ErrorKind::Upstream(inner) => assert!(!inner.is_retryable()),
                other => panic!("expected upstream error, got {other}"),
            }
        }
        // Both attempts hit upstream: the failure was never cached.
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_books_cached_and_canonically_ordered() {
        let source = Arc::new(MockSource::with_fixtures(genesis_fixtures()));
        let reader = reader_with(source.clone());

        let books = reader.books("kjv").await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].id.as_str(), "GEN");
        assert_eq!(books[1].id.as_str(), "EXO");

        reader.books("KJV").await.unwrap();
        // Alias casing resolves to the same key.
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_verse_counts_joins_concurrent_reads() {
        let source = Arc::new(MockSource::with_fixtures(genesis_fixtures()));
        let reader = reader_with(source.clone());

        let counts = reader.verse_counts("kjv", "GEN").await.unwrap();
        assert_eq!(counts, vec![(1, 31), (2, 2)]);
        // chapters + two verse lists.
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_single_verse_not_found_is_a_value() {
        let kjv = KJV_ID;
        let source = Arc::new(MockSource::with_fixtures([(
            format!("bibles/{kjv}/verses/GEN.1.7"),
            json!({ "data": { "id": "GEN.1.7", "content": "And God made the firmament" } }),
        )]));
        let reader = reader_with(source.clone());

        let found = reader.verse("kjv", "GEN", 1, 7).await.unwrap().found().unwrap();
        assert_eq!(found.number, VerseNumber::Number(7));

        // A verse upstream rejects is an Unavailable error, not NotFound;
        // NotFound is reserved for payloads that normalize to nothing.
        let err = reader.verse("kjv", "GEN", 1, 999).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Upstream(_)));
    }

    #[tokio::test]
    async fn test_summary_deduplicated_through_full_read_path() {
        let source = Arc::new(MockSource::with_fixtures([
            (
                format!("bibles/{KJV_ID}/books/PSA/chapters"),
                json!({ "data": [{ "id": "PSA.3", "number": "3" }] }),
            ),
            (
                format!("bibles/{KJV_ID}/chapters/PSA.3/verses"),
                json!({ "data": [
                    { "id": "PSA.3.1", "content": "A Psalm of David" },
                    { "number": "summary", "content": "when he fled from Absalom" },
                    { "number": "summary", "content": "a duplicate heading" },
                    { "content": "no number anywhere" },
                ]}),
            ),
        ]));
        let reader = reader_with(source.clone());

        let verses = reader.verses("kjv", "Psalms", 3).await.unwrap().found().unwrap();
        let numbers: Vec<_> = verses.iter().map(|v| v.number).collect();
        // One summary survives, sorted first; the unnumberable entry is gone.
        assert_eq!(numbers, vec![VerseNumber::Summary, VerseNumber::Number(1)]);
        assert_eq!(verses[0].text, "when he fled from Absalom");

        // The deduplicated records are what got cached.
        let again = reader.verses("kjv", "Psalms", 3).await.unwrap().found().unwrap();
        assert_eq!(again, verses);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let source = Arc::new(MockSource::with_fixtures(genesis_fixtures()));
        let reader = reader_with(source.clone());

        reader.books("kjv").await.unwrap();
        reader.clear_cache().await;
        reader.books("kjv").await.unwrap();
        assert_eq!(source.calls(), 2);
    }
}
