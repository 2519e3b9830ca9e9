use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Trailing verse number of an opaque upstream id, e.g. `GEN.1.7`.
regex!(VERSE_ID_SUFFIX_REGEX, r"\.(\d+)$");
// Trailing verse number of a human-readable reference, e.g. `GEN.1:7`.
regex!(REFERENCE_SUFFIX_REGEX, r":(\d+)$");

// Error response bodies are kept for diagnostics but truncated; a misbehaving
// upstream can return megabytes of HTML.
pub(crate) const MAX_ERROR_BODY_BYTES: usize = 256;

// Chapter entries whose number field holds this token are front-matter, not
// scripture.
pub(crate) const INTRO_CHAPTER_TOKEN: &str = "intro";

// Text shown for the synthetic placeholder verse when upstream has no usable
// verses at all, so downstream rendering never shows a totally empty pane.
pub(crate) const EMPTY_CHAPTER_MARKER: &str = "[no text available]";
