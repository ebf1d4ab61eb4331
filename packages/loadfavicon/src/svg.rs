//! # SVG
//!
//! Lightweight structural check for SVG documents, the document is not
//! parsed as XML

use std::sync::LazyLock;

use regex::Regex;

/// Number of leading bytes inspected when checking for binary content
const BINARY_PREFIX_LEN: usize = 24;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!--[\s\S]*?-->").expect("comment pattern should be valid"));

static SVG_DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:<\?xml[^>]*>\s*)?(?:<!doctype\s+svg[^>]*>\s*)?<svg[^>]*>[\s\S]*</svg>\s*$",
    )
    .expect("svg pattern should be valid")
});

/// Checks that `bytes` is a textual SVG document
///
/// The document may start with an XML declaration and an SVG doctype, must
/// contain a `<svg ...>` root and end with `</svg>`. HTML comments are
/// ignored anywhere in the document
pub fn is_valid_svg(bytes: &[u8]) -> bool {
    if is_binary(bytes) {
        return false;
    }

    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    let text = HTML_COMMENT.replace_all(text, "");

    SVG_DOCUMENT.is_match(&text)
}

/// Checks the first few bytes for control characters or invalid UTF-8
fn is_binary(bytes: &[u8]) -> bool {
    let prefix = &bytes[..bytes.len().min(BINARY_PREFIX_LEN)];

    if prefix.iter().any(|byte| *byte <= 8) {
        return true;
    }

    // A multi byte character cut off at the end of the prefix is fine
    match std::str::from_utf8(prefix) {
        Ok(_) => false,
        Err(err) => err.error_len().is_some(),
    }
}
