//! Text normalization shared by scoring and identity handling

use regex_lite::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Resolver prefixes that may wrap a DOI: `https://doi.org/`, `http://dx.doi.org/`, `doi:`
fn resolver_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(r"(?i)^(?:(?:https?://)?(?:dx\.)?doi\.org/|doi:\s*)")
            .expect("resolver prefix pattern is valid")
    })
}

/// Strip diacritics and lower-case.
///
/// `"Gérard Ångström"` becomes `"gerard angstrom"`. Used for titles, keyword
/// keys and author family names before any comparison.
pub fn fold(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical form of a citation identifier.
///
/// DOIs are case-insensitive and frequently arrive as resolver links, so both
/// `https://doi.org/10.1000/ABC` and `10.1000/abc` map to `10.1000/abc`.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    resolver_prefix()
        .replace(trimmed, "")
        .trim()
        .to_lowercase()
}
