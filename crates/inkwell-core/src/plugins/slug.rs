//! Slug derivation from declared plugin names.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").expect("slug pattern should compile"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("slug pattern should compile"));
static HYPHEN_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("slug pattern should compile"));

/// Sanitize a human-readable name into a URL-safe slug.
///
/// Lowercases, strips characters outside `[a-z0-9_\s-]`, turns whitespace
/// runs into single hyphens, collapses hyphen runs, and trims hyphens at
/// either end. Deterministic: equal names always yield equal slugs.
pub fn sanitize_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}
