//! Canned text source for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ErrorKind, Result};
use crate::source::TextSource;

/// In-memory [`TextSource`] serving canned payloads.
///
/// Fixtures are keyed by the endpoint path the HTTP implementation would
/// request; a path without a fixture answers 404 the way upstream would.
/// Every served request is counted, so tests can assert that a cached read
/// performed zero upstream calls.
pub struct MockSource {
    fixtures: HashMap<String, Value>,
    calls: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a mock source pre-populated with `(path, payload)` fixtures.
    ///
    /// # Example
    ///
    /// ```
    /// use lectio_upstream::MockSource;
    /// use serde_json::json;
    ///
    /// let source = MockSource::with_fixtures([
    ///     ("bibles/kjv/books", json!({ "data": [] })),
    /// ]);
    /// ```
    pub fn with_fixtures(fixtures: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Self {
            fixtures: fixtures.into_iter().map(|(path, value)| (path.into(), value)).collect(),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Total number of requests served (hits and misses alike).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every requested path, in order.
    pub fn requested_paths(&self) -> Vec<String> {
        self.log.lock().expect("mock lock poisoned").clone()
    }

    fn serve(&self, path: String) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().expect("mock lock poisoned").push(path.clone());
        match self.fixtures.get(&path) {
            Some(value) => Ok(value.clone()),
            None => exn::bail!(ErrorKind::Unavailable {
                status: Some(404),
                body: format!("mock: no fixture for {path}"),
            }),
        }
    }
}
impl Default for MockSource {
    fn default() -> Self {
        let fixtures: [(&str, Value); 0] = [];
        Self::with_fixtures(fixtures)
    }
}

#[async_trait]
impl TextSource for MockSource {
    async fn books(&self, version: &str) -> Result<Value> {
        self.serve(format!("bibles/{version}/books"))
    }

    async fn chapters(&self, version: &str, book: &str) -> Result<Value> {
        self.serve(format!("bibles/{version}/books/{book}/chapters"))
    }

    async fn verses(&self, version: &str, chapter_id: &str) -> Result<Value> {
        self.serve(format!("bibles/{version}/chapters/{chapter_id}/verses"))
    }

    async fn verse(&self, version: &str, verse_id: &str) -> Result<Value> {
        self.serve(format!("bibles/{version}/verses/{verse_id}"))
    }
}
