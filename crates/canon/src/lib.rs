//! Canonical scripture data model.
//!
//! This crate owns the stable Book/Chapter/Verse shape that the rest of the
//! system depends on, independent of upstream quirks. It also owns the two
//! pure lookup concerns that sit in front of every cache or network call:
//!
//! - **Version resolution**: mapping any version reference (alias,
//!   abbreviation, canonical id) to the canonical upstream version identifier.
//! - **Key derivation**: building collision-free cache keys from
//!   (kind, version, book, chapter, verse) tuples, and mapping free-text book
//!   names onto the fixed 66-book canon.
//!
//! Book-code derivation is the one place external, free-text book names enter
//! the system, so it is the validation boundary: anything outside the canon
//! table is rejected here rather than passed upstream.

pub mod books;
pub mod error;
mod key;
mod models;
pub mod versions;

pub use crate::key::{DerivedKey, Kind, derive_book_code, derive_key};
pub use crate::models::{Book, BookCode, Chapter, Verse, VerseNumber};
