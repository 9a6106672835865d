// src/utils/text.rs

//! Text normalization helpers.
//!
//! All functions here are total: malformed input produces a best-effort
//! string, never an error.

use std::sync::LazyLock;

use chrono::{Local, TimeZone};
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"));

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([가-힣a-zA-Z0-9_]+)").expect("valid hashtag pattern"));

/// Collapse whitespace runs (spaces, tabs, newlines) to single spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode named HTML entities and numeric character references in one pass.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Remove markup tags, decode entities and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    clean_text(&decode_entities(&without_tags))
}

/// Unique `#hashtag` tokens in first-seen order.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for caps in HASHTAG_RE.captures_iter(text) {
        let tag = caps[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Format a millisecond epoch timestamp as `YYYY-MM-DD HH:MM` in local time.
///
/// Returns an empty string for a zero or out-of-range timestamp.
pub fn format_timestamp(millis: i64) -> String {
    if millis <= 0 {
        return String::new();
    }
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => String::new(),
    }
}

/// Shorten text to `max` grapheme clusters, appending `...` when cut.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    format!("{}...", graphemes[..max].concat())
}

/// Parse a count such as `"1,234"` or `"댓글 12"`; returns 0 when no digits.
pub fn parse_count(text: &str) -> u64 {
    let cleaned = text.replace(',', "");
    let digits: String = cleaned
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
