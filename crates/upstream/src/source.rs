//! The upstream text API client.

use std::sync::Arc;

use async_trait::async_trait;
use exn::ResultExt;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::consts::MAX_ERROR_BODY_BYTES;
use crate::error::{ErrorKind, Result};

const API_KEY_HEADER: &str = "api-key";

pub type SourceHandle = Arc<dyn TextSource>;

/// Raw access to the upstream text API, one method per endpoint shape.
///
/// Implementations return the upstream JSON untouched (the `data` envelope
/// included); only the [`normalize`](crate::normalize) module ever looks
/// inside. The seam exists so tests can substitute canned payloads for the
/// network.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// `GET /bibles/{version}/books`
    async fn books(&self, version: &str) -> Result<Value>;
    /// `GET /bibles/{version}/books/{book}/chapters`
    async fn chapters(&self, version: &str, book: &str) -> Result<Value>;
    /// `GET /bibles/{version}/chapters/{chapter_id}/verses`
    async fn verses(&self, version: &str, chapter_id: &str) -> Result<Value>;
    /// `GET /bibles/{version}/verses/{verse_id}`
    async fn verse(&self, version: &str, verse_id: &str) -> Result<Value>;
}

/// HTTP implementation of [`TextSource`].
///
/// Injects the API key header on every request. No retries and no timeout
/// escalation here: retry policy belongs to the caller's HTTP client
/// defaults, and a hung call blocks only the request that issued it.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| exn::Exn::from(ErrorKind::Unavailable { status: None, body: err.to_string() }))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    #[instrument(skip(self))]
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, "fetching from upstream");
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|err| exn::Exn::from(ErrorKind::Unavailable { status: None, body: err.to_string() }))?;
        let status = response.status();
        // Bodies are read as text first: error responses may be JSON or
        // plain text, and a 2xx body still has to prove it parses.
        let body = response
            .text()
            .await
            .map_err(|err| exn::Exn::from(ErrorKind::Unavailable { status: Some(status.as_u16()), body: err.to_string() }))?;
        parse_response(status.as_u16(), &body)
    }
}

/// Triage a response by status and body: non-2xx is `Unavailable` with the
/// truncated body kept verbatim (it may be JSON or plain text), a 2xx body
/// that is not parseable JSON is `InvalidShape`.
fn parse_response(status: u16, body: &str) -> Result<Value> {
    if !(200..300).contains(&status) {
        exn::bail!(ErrorKind::Unavailable { status: Some(status), body: truncate(body) });
    }
    serde_json::from_str(body).or_raise(|| ErrorKind::InvalidShape(truncate(body)))
}

#[async_trait]
impl TextSource for HttpSource {
    async fn books(&self, version: &str) -> Result<Value> {
        self.get_json(&format!("bibles/{version}/books")).await
    }

    async fn chapters(&self, version: &str, book: &str) -> Result<Value> {
        self.get_json(&format!("bibles/{version}/books/{book}/chapters")).await
    }

    async fn verses(&self, version: &str, chapter_id: &str) -> Result<Value> {
        self.get_json(&format!("bibles/{version}/chapters/{chapter_id}/verses")).await
    }

    async fn verse(&self, version: &str, verse_id: &str) -> Result<Value> {
        self.get_json(&format!("bibles/{version}/verses/{verse_id}")).await
    }
}

fn truncate(body: &str) -> String {
    let mut end = MAX_ERROR_BODY_BYTES.min(body.len());
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_success_status_maps_to_unavailable_with_truncated_body() {
        let oversized = "denied ".repeat(100);
        let err = parse_response(403, &oversized).unwrap_err();
        match &*err {
            ErrorKind::Unavailable { status: Some(403), body } => {
                assert_eq!(body.len(), MAX_ERROR_BODY_BYTES);
                assert!(body.starts_with("denied"));
            },
            other => panic!("expected 403 Unavailable, got {other}"),
        }
        assert!(!err.is_retryable());
        assert!(parse_response(503, "").unwrap_err().is_retryable());
    }

    #[test]
    fn test_success_status_with_non_json_body_is_invalid_shape() {
        let err = parse_response(200, "<html>maintenance page</html>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidShape(body) if body.starts_with("<html>")));

        let value = parse_response(200, r#"{ "data": [] }"#).unwrap();
        assert_eq!(value, serde_json::json!({ "data": [] }));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY_BYTES);
        let truncated = truncate(&body);
        assert!(truncated.len() <= MAX_ERROR_BODY_BYTES);
        assert!(truncated.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let source = HttpSource::new("https://example.test/v1/", "secret").unwrap();
        assert_eq!(source.base_url, "https://example.test/v1");
    }
}
