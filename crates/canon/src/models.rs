//! The canonical Book/Chapter/Verse records.
//!
//! Everything downstream of the normalizer consumes these types; nothing
//! downstream of the normalizer ever inspects a raw upstream payload.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::de::{self, Deserializer, Unexpected};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};

/// A canonical three-letter book code (e.g. `GEN`, `MAT`, `1CO`).
///
/// Always uppercase ASCII alphanumerics; construction goes through
/// [`TryFrom`] or [`derive_book_code`](crate::derive_book_code), so a held
/// value is known to be well-formed (though not necessarily in the canon
/// table; only `derive_book_code` checks membership).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookCode(String);

impl BookCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Construct from a canon table entry, which is well-formed by
    /// construction (and pinned by the table's tests).
    pub(crate) fn from_canon(code: &str) -> Self {
        Self(code.to_ascii_uppercase())
    }
}
impl TryFrom<&str> for BookCode {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            exn::bail!(ErrorKind::InvalidBookCode(value.to_string()));
        }
        Ok(Self(code))
    }
}
impl Display for BookCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl Serialize for BookCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
impl<'de> Deserialize<'de> for BookCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BookCode::try_from(raw.as_str())
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&raw), &"a three-letter book code"))
    }
}

/// A book of the canon. Immutable once loaded; ordering is fixed by the
/// static reference table in [`books`](crate::books), never by upstream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookCode,
    pub display_name: String,
}

/// A chapter within a book.
///
/// `number` is the natural key; `upstream_id` is only needed to fetch verses
/// and is never exposed beyond the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub upstream_id: String,
    pub number: u32,
}

/// A verse number: either a natural number or the synthetic `summary` entry.
///
/// At most one summary verse may exist per chapter. Ordering puts the summary
/// first, then natural numbers ascending. Serialized as the literal string
/// `"summary"` or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerseNumber {
    Summary,
    Number(u32),
}

impl Ord for VerseNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Summary, Self::Summary) => Ordering::Equal,
            (Self::Summary, Self::Number(_)) => Ordering::Less,
            (Self::Number(_), Self::Summary) => Ordering::Greater,
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
        }
    }
}
impl PartialOrd for VerseNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Display for VerseNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Summary => f.write_str("summary"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}
impl From<u32> for VerseNumber {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}
impl Serialize for VerseNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Summary => serializer.serialize_str("summary"),
            Self::Number(n) => serializer.serialize_u32(*n),
        }
    }
}
impl<'de> Deserialize<'de> for VerseNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;
        impl de::Visitor<'_> for Visitor {
            type Value = VerseNumber;
            fn expecting(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str("a positive verse number or the string \"summary\"")
            }
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                u32::try_from(v)
                    .map(VerseNumber::Number)
                    .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    "summary" => Ok(VerseNumber::Summary),
                    other => other
                        .parse::<u32>()
                        .map(VerseNumber::Number)
                        .map_err(|_| E::invalid_value(Unexpected::Str(other), &self)),
                }
            }
        }
        deserializer.deserialize_any(Visitor)
    }
}

/// A single verse in canonical form: plain text (HTML already stripped) plus
/// a reference string uniquely identifying version+book+chapter+verse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: VerseNumber,
    pub text: String,
    pub reference: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_code_normalizes_case() {
        let code = BookCode::try_from("gen").unwrap();
        assert_eq!(code.as_str(), "GEN");
    }

    #[test]
    fn test_book_code_rejects_malformed() {
        assert!(BookCode::try_from("GENESIS").is_err());
        assert!(BookCode::try_from("G!N").is_err());
        assert!(BookCode::try_from("").is_err());
    }

    #[test]
    fn test_verse_number_ordering() {
        let mut numbers = vec![VerseNumber::Number(3), VerseNumber::Summary, VerseNumber::Number(1)];
        numbers.sort();
        assert_eq!(numbers, vec![VerseNumber::Summary, VerseNumber::Number(1), VerseNumber::Number(3)]);
    }

    #[test]
    fn test_verse_number_serde_round_trip() {
        let summary = serde_json::to_string(&VerseNumber::Summary).unwrap();
        assert_eq!(summary, "\"summary\"");
        assert_eq!(serde_json::from_str::<VerseNumber>(&summary).unwrap(), VerseNumber::Summary);

        let seven = serde_json::to_string(&VerseNumber::Number(7)).unwrap();
        assert_eq!(seven, "7");
        assert_eq!(serde_json::from_str::<VerseNumber>(&seven).unwrap(), VerseNumber::Number(7));
    }

    #[test]
    fn test_verse_number_deserialize_numeric_string() {
        // Upstream sometimes sends numbers as strings.
        assert_eq!(serde_json::from_str::<VerseNumber>("\"12\"").unwrap(), VerseNumber::Number(12));
        assert!(serde_json::from_str::<VerseNumber>("\"intro\"").is_err());
    }
}
