//! The static translation/version table and version resolution.
//!
//! Loaded once at process start (it's a `const` table); `id` is the only
//! value ever sent upstream.

/// A translation known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    /// The opaque upstream identifier. The only value ever sent upstream.
    pub id: &'static str,
    /// Human-friendly aliases accepted by [`resolve`], matched case-insensitively.
    pub aliases: &'static [&'static str],
    /// BCP-47 language tag.
    pub language: &'static str,
    /// Whether this process will serve the version. Unsupported entries are
    /// kept in the table so their ids still resolve to themselves upstream.
    pub supported: bool,
}

/// Every version the system knows about.
pub const VERSIONS: [VersionInfo; 4] = [
    VersionInfo {
        id: "de4e12af7f28f599-02",
        aliases: &["kjv", "king james", "king james version"],
        language: "en",
        supported: true,
    },
    VersionInfo {
        id: "06125adad2d5898a-01",
        aliases: &["asv", "american standard", "american standard version"],
        language: "en",
        supported: true,
    },
    VersionInfo {
        id: "9879dbb7cfe39e4d-04",
        aliases: &["web", "world english", "world english bible"],
        language: "en",
        supported: true,
    },
    VersionInfo {
        id: "c315fa9f71d4af3a-01",
        aliases: &["gnv", "geneva", "geneva bible"],
        language: "en",
        supported: false,
    },
];

/// Map any version reference (alias, abbreviation, canonical id) to the
/// canonical upstream version identifier.
///
/// Lookup is case-insensitive. Unrecognized references are returned
/// unchanged: the upstream call is allowed to fail naturally, because
/// failing fast here would mask a recoverable upstream 404 versus a true
/// misconfiguration. The caller's error handling distinguishes them.
pub fn resolve(reference: &str) -> String {
    let needle = reference.trim();
    for version in &VERSIONS {
        if version.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(needle)) {
            return version.id.to_string();
        }
    }
    if let Some(version) = VERSIONS.iter().find(|v| v.id.eq_ignore_ascii_case(needle))
        && version.supported
    {
        return version.id.to_string();
    }
    reference.to_string()
}

/// Look up the table entry for a canonical id.
pub fn by_id(id: &str) -> Option<&'static VersionInfo> {
    VERSIONS.iter().find(|v| v.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("kjv", "de4e12af7f28f599-02")]
    #[case("KJV", "de4e12af7f28f599-02")]
    #[case("King James Version", "de4e12af7f28f599-02")]
    #[case("web", "9879dbb7cfe39e4d-04")]
    #[case(" asv ", "06125adad2d5898a-01")]
    fn test_resolve_aliases(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(resolve(reference), expected);
    }

    #[test]
    fn test_resolve_passes_canonical_id_through() {
        assert_eq!(resolve("de4e12af7f28f599-02"), "de4e12af7f28f599-02");
    }

    #[test]
    fn test_resolve_never_fails_on_unknown_reference() {
        // Unknown references pass through unchanged and fail upstream instead.
        assert_eq!(resolve("klingon-2041"), "klingon-2041");
    }

    #[test]
    fn test_unsupported_id_resolves_by_alias_only() {
        // The alias maps to the id, but the raw id of an unsupported version
        // is not vouched for; it passes through like any unknown reference.
        assert_eq!(resolve("gnv"), "c315fa9f71d4af3a-01");
        assert_eq!(resolve("c315fa9f71d4af3a-01"), "c315fa9f71d4af3a-01");
        assert!(!by_id("c315fa9f71d4af3a-01").unwrap().supported);
    }
}
