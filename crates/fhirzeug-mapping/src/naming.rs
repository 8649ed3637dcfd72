//! Identifier helpers shared by the mapping rules and the resolver

use regex::Regex;
use std::sync::LazyLock;

static ILLEGAL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_]").expect("identifier character class is a valid regex")
});

/// Replace every character that cannot appear in an identifier with `_`,
/// and prefix `_` when the name would start with a digit.
pub fn sanitize_identifier(name: &str) -> String {
    let cleaned = ILLEGAL_CHARS.replace_all(name, "_");
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{cleaned}")
    } else {
        cleaned.into_owned()
    }
}

/// `string` -> `String`
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Patient` -> `patient`
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Last path segment of a canonical URL, without version, fragment or query
pub fn url_tail(url: &str) -> &str {
    let trimmed = url
        .split(['#', '?', '|'])
        .next()
        .unwrap_or(url)
        .trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
