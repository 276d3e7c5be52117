//! Marker scanning over free-form backend text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::protocol::{CLOSING_MARKER, SECTION_HEADERS};

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("number pattern is valid")
});

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+#.-]*").expect("fence pattern is valid"));

/// Text after the first `header`, up to whichever known header or the closing
/// marker comes first after it. Headers may appear in any order.
pub fn find_block<'a>(text: &'a str, header: &str) -> Option<&'a str> {
    let start = text.find(header)? + header.len();
    let rest = &text[start..];
    let end = SECTION_HEADERS
        .iter()
        .chain(std::iter::once(&CLOSING_MARKER))
        .filter_map(|boundary| rest.find(boundary))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// [`find_block`], empty when the header is absent.
pub fn block(text: &str, header: &str) -> String {
    find_block(text, header).unwrap_or_default().to_string()
}

/// First non-blank line after `key`. Leading whitespace, including line
/// breaks, is skipped before the line is taken.
pub fn field_value<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let start = text.find(key)? + key.len();
    let rest = text[start..].trim_start();
    Some(rest.lines().next().unwrap_or_default().trim())
}

/// Leading numeric prefix of `value`, 0 when there is none.
pub fn parse_confidence(value: &str) -> f64 {
    LEADING_NUMBER
        .find(value.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Remove fenced-code markup (```` ``` ```` with or without a language tag).
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}
