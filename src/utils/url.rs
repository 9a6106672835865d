// src/utils/url.rs

//! URL manipulation utilities.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use url::Url;

static ARTICLES_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"articles/(\d+)").expect("valid path pattern"));

static LONG_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{5,})").expect("valid digits pattern"));

/// Prefix of placeholder IDs produced when a URL carries no recognizable ID.
pub const SYNTHETIC_ID_PREFIX: &str = "unknown-";

/// Resolve a possibly relative `href` against `base`.
///
/// # Examples
/// ```
/// use cafe_crawler::utils::url::resolve_url;
///
/// assert_eq!(
///     resolve_url("/ArticleRead.nhn?articleid=1", "https://cafe.naver.com"),
///     "https://cafe.naver.com/ArticleRead.nhn?articleid=1"
/// );
/// ```
pub fn resolve_url(href: &str, base: &str) -> String {
    if href.is_empty() {
        return String::new();
    }

    // Already absolute
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    // Protocol-relative
    if href.starts_with("//") {
        return format!("https:{href}");
    }

    let base = base.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}

/// Read a query parameter from an absolute or site-relative URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Last non-empty path segment of a URL.
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = parse_lenient(url)?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// Extract the article identifier from an article URL.
///
/// Tries `articles/{digits}`, then `articleid=`, then `number=`, then the first
/// run of five or more digits. Falls back to a synthetic `unknown-<millis>` ID.
pub fn extract_article_id(url: &str) -> String {
    if let Some(caps) = ARTICLES_PATH_RE.captures(url) {
        return caps[1].to_string();
    }

    if url.contains("articleid=") {
        if let Some(id) = query_param(url, "articleid") {
            return id;
        }
    }

    if url.contains("number=") {
        if let Some(id) = query_param(url, "number") {
            return id;
        }
    }

    if let Some(caps) = LONG_DIGITS_RE.captures(url) {
        return caps[1].to_string();
    }

    format!("{SYNTHETIC_ID_PREFIX}{}", Utc::now().timestamp_millis())
}

/// Whether an ID was produced by [`extract_article_id`] as a placeholder.
pub fn is_synthetic_id(id: &str) -> bool {
    id.starts_with(SYNTHETIC_ID_PREFIX)
}

fn parse_lenient(url: &str) -> Option<Url> {
    Url::parse(url).ok().or_else(|| {
        let base = Url::parse("https://localhost/").ok()?;
        base.join(url).ok()
    })
}
