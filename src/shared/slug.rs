//! Slug derivation for catalogue names

use regex::Regex;
use std::sync::LazyLock;

/// Anything that is not an ASCII word character or a hyphen
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid slug regex"));

/// Derive the URL slug for a display name.
///
/// Lowercases, turns every space into a hyphen and drops everything that is
/// not a word character or hyphen. Uniqueness is not guaranteed here; the
/// unique index on `slug` is what rejects collisions.
pub fn derive_slug(name: &str) -> String {
    let hyphenated = name.to_lowercase().replace(' ', "-");
    NON_SLUG_CHARS.replace_all(&hyphenated, "").into_owned()
}
