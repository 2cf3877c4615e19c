use once_cell::sync::Lazy;
use regex::Regex;

static NON_ALNUM_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Derive the public funnel slug from a business name: lowercased, runs of
/// non-alphanumerics collapsed to a single hyphen, edge hyphens stripped.
///
/// Deterministic and idempotent. Uniqueness across tenants is NOT guaranteed;
/// distinct names can normalize to the same slug.
pub fn derive_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated = NON_ALNUM_RUN.replace_all(&lowered, "-");
    hyphenated.trim_matches('-').to_string()
}
