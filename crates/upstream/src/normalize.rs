//! Normalization of raw upstream payloads into the canonical model.
//!
//! Everything here is defensive: upstream field names vary, verse text
//! arrives as HTML with entities, chapter lists contain front-matter, and
//! whole payloads are sometimes missing. Normalization never raises for
//! partially-missing fields: it degrades to explicit fallbacks so a caller
//! can tell "no data available" from "error".

use lectio_canon::{Book, BookCode, Chapter, Verse, VerseNumber, books};
use scraper::Html;
use serde_json::Value;

use crate::consts;

/// Where a verse list came from; used to synthesize references for entries
/// that don't carry their own.
#[derive(Debug, Clone, Copy)]
pub struct VerseContext<'a> {
    pub version: &'a str,
    pub book: &'a BookCode,
    pub chapter: u32,
}

impl VerseContext<'_> {
    fn reference_for(&self, number: VerseNumber) -> String {
        format!("{}/{}.{}.{}", self.version, self.book, self.chapter, number)
    }
}

/// Upstream wraps everything in a `data` envelope; tolerate its absence.
fn data(raw: &Value) -> &Value {
    raw.get("data").unwrap_or(raw)
}

fn entries(raw: &Value) -> &[Value] {
    data(raw).as_array().map(Vec::as_slice).unwrap_or_default()
}

fn str_field<'a>(raw: &'a Value, field: &str) -> Option<&'a str> {
    raw.get(field).and_then(Value::as_str)
}

/// Normalize an upstream book list.
///
/// Only entries mappable into the 66-book canon survive, and the result is
/// emitted in canonical order (Old Testament then New Testament) regardless
/// of upstream order. Display names prefer the upstream `name` field and
/// fall back to the static long name.
pub fn normalize_books(raw: &Value) -> Vec<Book> {
    let mut named: Vec<(BookCode, Option<String>)> = Vec::new();
    for entry in entries(raw) {
        let candidate = str_field(entry, "id")
            .or_else(|| str_field(entry, "abbreviation"))
            .or_else(|| str_field(entry, "name"));
        let Some(code) = candidate.and_then(|c| lectio_canon::derive_book_code(c).ok()) else {
            // Apocrypha, front-matter pseudo-books, or garbage: not canon.
            continue;
        };
        let display = str_field(entry, "name").map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        named.push((code, display));
    }
    books::all()
        .into_iter()
        .filter_map(|book| {
            let (_, display) = named.iter().find(|(code, _)| *code == book.id)?;
            Some(Book {
                display_name: display.clone().unwrap_or(book.display_name),
                id: book.id,
            })
        })
        .collect()
}

/// Normalize an upstream chapter list.
///
/// Entries whose number field is the literal `intro` token are front-matter
/// and filtered out; entries without a parseable number or without the
/// upstream id needed to fetch their verses are dropped. The remainder is
/// sorted ascending by chapter number. An empty result is returned as-is;
/// "no chapters" propagates as a not-found condition, never as fabricated
/// records.
pub fn normalize_chapter_list(raw: &Value) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = entries(raw)
        .iter()
        .filter_map(|entry| {
            let number = chapter_number(entry)?;
            let upstream_id = str_field(entry, "id")?;
            Some(Chapter { upstream_id: upstream_id.to_string(), number })
        })
        .collect();
    chapters.sort_by_key(|chapter| chapter.number);
    chapters
}

fn chapter_number(entry: &Value) -> Option<u32> {
    match entry.get("number") {
        Some(Value::String(s)) if s.eq_ignore_ascii_case(consts::INTRO_CHAPTER_TOKEN) => None,
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Extract a verse number from a raw verse entry.
///
/// Tries, in order: a trailing `.N` segment of the opaque `id`, the `number`
/// field (numeric, numeric string, or the `summary` sentinel), then a `:N`
/// suffix of the human-readable `reference`. The first successful parse
/// wins. The order is policy, preserved for compatibility: malformed data
/// could satisfy an earlier heuristic incorrectly, and that's accepted.
fn verse_number(entry: &Value) -> Option<VerseNumber> {
    if let Some(id) = str_field(entry, "id")
        && let Some(captures) = consts::VERSE_ID_SUFFIX_REGEX.captures(id)
        && let Ok(number) = captures[1].parse::<u32>()
    {
        return Some(VerseNumber::Number(number));
    }
    match entry.get("number") {
        Some(Value::String(s)) if s == "summary" => return Some(VerseNumber::Summary),
        Some(Value::String(s)) => {
            if let Ok(number) = s.trim().parse::<u32>() {
                return Some(VerseNumber::Number(number));
            }
        },
        Some(Value::Number(n)) => {
            if let Some(number) = n.as_u64().and_then(|n| u32::try_from(n).ok()) {
                return Some(VerseNumber::Number(number));
            }
        },
        _ => {},
    }
    if let Some(reference) = str_field(entry, "reference")
        && let Some(captures) = consts::REFERENCE_SUFFIX_REGEX.captures(reference)
        && let Ok(number) = captures[1].parse::<u32>()
    {
        return Some(VerseNumber::Number(number));
    }
    None
}

/// Strip HTML tags, decode entities and collapse run-length whitespace.
fn clean_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize one raw verse entry.
///
/// Returns `None` when no verse number can be extracted: a verse is dropped
/// rather than surfaced with a fabricated number. Text tries `content`, then
/// `text`, then `reference`, falling back to empty.
pub fn normalize_verse(entry: &Value, ctx: &VerseContext<'_>) -> Option<Verse> {
    let number = verse_number(entry)?;
    let text = str_field(entry, "content")
        .or_else(|| str_field(entry, "text"))
        .or_else(|| str_field(entry, "reference"))
        .map(clean_text)
        .unwrap_or_default();
    let reference = str_field(entry, "reference")
        .map(str::to_string)
        .unwrap_or_else(|| ctx.reference_for(number));
    Some(Verse { number, text, reference })
}

/// Normalize an upstream verse list.
///
/// Drops entries without an extractable number, keeps at most one `summary`
/// verse, and sorts ascending with the summary (if any) first. When nothing
/// usable remains at all, returns the single synthetic placeholder verse
/// numbered 1 with marker text, so downstream rendering never shows a
/// totally empty pane.
pub fn normalize_verses(raw: &Value, ctx: &VerseContext<'_>) -> Vec<Verse> {
    let mut verses: Vec<Verse> =
        entries(raw).iter().filter_map(|entry| normalize_verse(entry, ctx)).collect();
    verses.sort_by(|a, b| a.number.cmp(&b.number));
    let mut seen_summary = false;
    verses.retain(|verse| match verse.number {
        VerseNumber::Summary => !std::mem::replace(&mut seen_summary, true),
        VerseNumber::Number(_) => true,
    });
    if verses.is_empty() {
        verses.push(placeholder(ctx));
    }
    verses
}

/// Normalize a single-verse payload (the `data` envelope holds one object).
pub fn normalize_single_verse(raw: &Value, ctx: &VerseContext<'_>) -> Option<Verse> {
    normalize_verse(data(raw), ctx)
}

fn placeholder(ctx: &VerseContext<'_>) -> Verse {
    let number = VerseNumber::Number(1);
    Verse {
        number,
        text: consts::EMPTY_CHAPTER_MARKER.to_string(),
        reference: ctx.reference_for(number),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn ctx<'a>(book: &'a BookCode) -> VerseContext<'a> {
        VerseContext { version: "de4e12af7f28f599-02", book, chapter: 1 }
    }

    fn genesis() -> BookCode {
        BookCode::try_from("GEN").unwrap()
    }

    #[test]
    fn test_books_reordered_and_filtered_against_canon() {
        let raw = json!({ "data": [
            { "id": "MAT", "name": "Matthew" },
            { "id": "GEN", "name": "Genesis" },
            { "id": "TOB", "name": "Tobit" },
            { "abbreviation": "exo", "name": "  Exodus  " },
        ]});
        let books = normalize_books(&raw);
        let codes: Vec<_> = books.iter().map(|b| b.id.as_str()).collect();
        // Canonical order, apocrypha dropped.
        assert_eq!(codes, vec!["GEN", "EXO", "MAT"]);
        assert_eq!(books[1].display_name, "Exodus");
    }

    #[test]
    fn test_books_display_name_falls_back_to_static_table() {
        let raw = json!({ "data": [{ "id": "SNG" }] });
        let books = normalize_books(&raw);
        assert_eq!(books[0].display_name, "Song of Solomon");
    }

    #[test]
    fn test_chapter_list_filters_intro_and_sorts() {
        let raw = json!({ "data": [
            { "id": "GEN.2", "number": "2" },
            { "id": "GEN.intro", "number": "intro" },
            { "id": "GEN.1", "number": "1" },
            { "id": "GEN.bad", "number": "foreword" },
            { "number": "3" },
        ]});
        let chapters = normalize_chapter_list(&raw);
        let numbers: Vec<_> = chapters.iter().map(|c| c.number).collect();
        // Intro, unparseable and id-less entries all dropped.
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(chapters[0].upstream_id, "GEN.1");
    }

    #[test]
    fn test_empty_chapter_list_stays_empty() {
        assert!(normalize_chapter_list(&json!({ "data": [] })).is_empty());
        assert!(normalize_chapter_list(&json!({ "data": "garbage" })).is_empty());
    }

    #[rstest]
    // (a) trailing id segment wins over everything else.
    #[case(json!({ "id": "GEN.1.5", "number": "9", "reference": "GEN.1:9" }), VerseNumber::Number(5))]
    // (b) number field, numeric or string.
    #[case(json!({ "number": 4 }), VerseNumber::Number(4))]
    #[case(json!({ "number": "12" }), VerseNumber::Number(12))]
    #[case(json!({ "number": "summary" }), VerseNumber::Summary)]
    // (c) reference colon-suffix as the last resort.
    #[case(json!({ "reference": "GEN.1:7" }), VerseNumber::Number(7))]
    fn test_verse_number_heuristic_order(#[case] entry: Value, #[case] expected: VerseNumber) {
        let book = genesis();
        let verse = normalize_verse(&entry, &ctx(&book)).unwrap();
        assert_eq!(verse.number, expected);
    }

    #[test]
    fn test_unnumberable_verse_is_dropped() {
        let book = genesis();
        let entry = json!({ "content": "orphaned text", "id": "GEN.1.intro" });
        assert!(normalize_verse(&entry, &ctx(&book)).is_none());

        let raw = json!({ "data": [
            { "id": "GEN.1.1", "content": "In the beginning" },
            { "content": "no number anywhere" },
        ]});
        let verses = normalize_verses(&raw, &ctx(&book));
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].number, VerseNumber::Number(1));
    }

    #[test]
    fn test_text_extraction_strips_html_and_collapses_whitespace() {
        let book = genesis();
        let entry = json!({
            "id": "GEN.1.3",
            "content": "<p class=\"v\">And God said, &quot;Let there be\n\n   light&quot;; and there was light.</p>",
        });
        let verse = normalize_verse(&entry, &ctx(&book)).unwrap();
        assert_eq!(verse.text, "And God said, \"Let there be light\"; and there was light.");
    }

    #[rstest]
    #[case("&amp;", "&")]
    #[case("&quot;selah&quot;", "\"selah\"")]
    #[case("&apos;", "'")]
    fn test_entities_decoded(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_text(raw), expected);
    }

    #[test]
    fn test_text_field_fallback_order() {
        let book = genesis();
        let with_text = json!({ "id": "GEN.1.1", "text": "from text field" });
        assert_eq!(normalize_verse(&with_text, &ctx(&book)).unwrap().text, "from text field");

        let reference_only = json!({ "reference": "GEN.1:2" });
        assert_eq!(normalize_verse(&reference_only, &ctx(&book)).unwrap().text, "GEN.1:2");
    }

    #[test]
    fn test_reference_synthesized_when_missing() {
        let book = genesis();
        let entry = json!({ "id": "GEN.1.3", "content": "..." });
        let verse = normalize_verse(&entry, &ctx(&book)).unwrap();
        assert_eq!(verse.reference, "de4e12af7f28f599-02/GEN.1.3");
    }

    #[test]
    fn test_summary_deduplicated_and_sorted_first() {
        let book = genesis();
        let raw = json!({ "data": [
            { "id": "GEN.1.2", "content": "second" },
            { "number": "summary", "content": "a summary" },
            { "id": "GEN.1.1", "content": "first" },
            { "number": "summary", "content": "a duplicate summary" },
        ]});
        let verses = normalize_verses(&raw, &ctx(&book));
        let numbers: Vec<_> = verses.iter().map(|v| v.number).collect();
        assert_eq!(numbers, vec![VerseNumber::Summary, VerseNumber::Number(1), VerseNumber::Number(2)]);
        // "Sorted first" also means the first summary wins the dedup.
        assert_eq!(verses[0].text, "a summary");
    }

    #[test]
    fn test_empty_verse_list_yields_placeholder() {
        let book = genesis();
        let verses = normalize_verses(&json!({ "data": [] }), &ctx(&book));
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].number, VerseNumber::Number(1));
        assert_eq!(verses[0].text, "[no text available]");
        assert_eq!(verses[0].reference, "de4e12af7f28f599-02/GEN.1.1");
    }

    #[test]
    fn test_single_verse_payload() {
        let book = genesis();
        let raw = json!({ "data": { "id": "GEN.1.7", "content": "And God made the firmament" } });
        let verse = normalize_single_verse(&raw, &ctx(&book)).unwrap();
        assert_eq!(verse.number, VerseNumber::Number(7));
    }
}
