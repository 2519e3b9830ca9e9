//! Cache-key derivation.
//!
//! Keys are built from (kind, version, book, chapter, verse) tuples. Every
//! component is normalized down to `[a-z0-9.-]` before joining with `/`, so
//! the separator can never appear inside a component and distinct tuples can
//! never collide. In particular `verses/x/gen/1/1` and `verses/x/gen/11/1`
//! stay distinct where naive concatenation would not.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::books;
use crate::error::{ErrorKind, Result};
use crate::models::BookCode;

/// The kinds of cacheable payload, one per upstream endpoint shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Books,
    Chapters,
    Verses,
    Verse,
}
impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Chapters => "chapters",
            Self::Verses => "verses",
            Self::Verse => "verse",
        }
    }
}
impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A derived cache key. Opaque to the tiers; only this module constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedKey(String);

impl DerivedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for DerivedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Normalize one key component: lowercase, and anything outside
/// `[a-z0-9.-]` becomes `-` so the `/` separator cannot be smuggled in.
fn sanitize(component: &str) -> String {
    component
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '-' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '-',
        })
        .collect()
}

/// Map a free-text book name onto the canonical three-letter code.
///
/// Matches case-insensitively against both canonical codes and long names.
/// This is the validation boundary for external book references: anything
/// outside the fixed 66-book canon is rejected rather than passed upstream.
pub fn derive_book_code(name: &str) -> Result<BookCode> {
    let Some((code, _)) = books::find(name) else {
        exn::bail!(ErrorKind::UnknownBook(name.to_string()));
    };
    Ok(BookCode::from_canon(code))
}

/// Build the canonical cache key for a (kind, version, book, chapter, verse)
/// tuple. Omitted trailing components are simply absent; present components
/// are sanitized and joined with `/`.
///
/// Omission is tail-only: a chapter without a book (or a verse without a
/// chapter) would let a numeric component slide into the position of an
/// all-digit book code and collide. Gap omissions are a caller bug and are
/// rejected in debug builds.
pub fn derive_key(
    kind: Kind,
    version: &str,
    book: Option<&BookCode>,
    chapter: Option<u32>,
    verse: Option<u32>,
) -> DerivedKey {
    debug_assert!(book.is_some() || chapter.is_none(), "chapter given without a book");
    debug_assert!(chapter.is_some() || verse.is_none(), "verse given without a chapter");
    let mut parts = vec![kind.as_str().to_string(), sanitize(version)];
    if let Some(book) = book {
        parts.push(sanitize(book.as_str()));
    }
    if let Some(chapter) = chapter {
        parts.push(chapter.to_string());
    }
    if let Some(verse) = verse {
        parts.push(verse.to_string());
    }
    DerivedKey(parts.join("/"))
}
