//! Upstream text API client and payload normalization.
//!
//! The upstream API is paginated and inconsistently shaped: field names vary,
//! verse text arrives as HTML, front-matter masquerades as chapters. This
//! crate is the single choke point where those untrusted shapes are turned
//! into the canonical model: raw payloads travel as [`serde_json::Value`]
//! and nothing outside [`normalize`] ever inspects their fields.

mod consts;
pub mod error;
#[cfg(feature = "mock")]
mod mock;
pub mod normalize;
mod source;

#[cfg(feature = "mock")]
pub use crate::mock::MockSource;
pub use crate::normalize::VerseContext;
pub use crate::source::{HttpSource, SourceHandle, TextSource};
