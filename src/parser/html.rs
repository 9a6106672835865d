// src/parser/html.rs

//! Generic extraction from raw markup.
//!
//! Every function degrades to an empty result on malformed input or a bad
//! pattern; nothing here returns an error.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::utils::text::{clean_text, strip_tags};
use crate::utils::url::resolve_url;

/// An anchor found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// An image found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// Which table to read and whether its first row is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub has_header: bool,
    pub table_index: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            table_index: 0,
        }
    }
}

/// Cell text of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TableData {
    WithHeader {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Rows(Vec<Vec<String>>),
}

impl TableData {
    fn empty(has_header: bool) -> Self {
        if has_header {
            Self::WithHeader {
                headers: Vec::new(),
                rows: Vec::new(),
            }
        } else {
            Self::Rows(Vec::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::WithHeader { headers, rows } => headers.is_empty() && rows.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
        }
    }
}

/// First capture of `group` for `pattern`, cleaned. `None` if nothing matches.
pub fn extract_pattern(markup: &str, pattern: &str, group: usize) -> Option<String> {
    let re = compile(pattern)?;
    let caps = re.captures(markup)?;
    let text = clean_text(caps.get(group)?.as_str());
    (!text.is_empty()).then_some(text)
}

/// Every capture of `group` for `pattern`, cleaned, empty captures skipped.
pub fn extract_all_patterns(markup: &str, pattern: &str, group: usize) -> Vec<String> {
    let Some(re) = compile(pattern) else {
        return Vec::new();
    };
    re.captures_iter(markup)
        .filter_map(|caps| caps.get(group).map(|m| clean_text(m.as_str())))
        .filter(|text| !text.is_empty())
        .collect()
}

/// `content` of the first meta tag whose `name` or `property` equals `name`.
pub fn extract_meta_content(markup: &str, name: &str) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse("meta").ok()?;
    document
        .select(&selector)
        .filter(|meta| {
            let value = meta.value();
            value.attr("name") == Some(name) || value.attr("property") == Some(name)
        })
        .find_map(|meta| meta.value().attr("content"))
        .map(|content| clean_text(content))
}

/// Text of the first `tag` element matching all attribute filters.
///
/// A `class` filter matches a single class token; any other attribute must
/// be equal.
pub fn extract_element(markup: &str, tag: &str, filters: &[(&str, &str)]) -> Option<String> {
    let document = Html::parse_document(markup);
    let selector = Selector::parse(tag).ok()?;
    document
        .select(&selector)
        .find(|element| matches_filters(element, filters))
        .map(|element| strip_tags(&element.inner_html()))
}

/// All anchors with an `href`, in document order, resolved against `base`.
pub fn extract_links(markup: &str, base: &str) -> Vec<Link> {
    let document = Html::parse_document(markup);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some(Link {
                href: resolve_url(href, base),
                text: clean_text(&a.text().collect::<String>()),
            })
        })
        .collect()
}

/// All images with a `src`, in document order, resolved against `base`.
pub fn extract_images(markup: &str, base: &str) -> Vec<Image> {
    let document = Html::parse_document(markup);
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|img| {
            let src = img.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            Some(Image {
                src: resolve_url(src, base),
                alt: clean_text(img.value().attr("alt").unwrap_or("")),
            })
        })
        .collect()
}

/// Cell text of the `table_index`-th table.
pub fn extract_table_data(markup: &str, options: TableOptions) -> TableData {
    let document = Html::parse_document(markup);
    let (Ok(table_sel), Ok(row_sel), Ok(cell_sel)) = (
        Selector::parse("table"),
        Selector::parse("tr"),
        Selector::parse("td, th"),
    ) else {
        return TableData::empty(options.has_header);
    };

    let Some(table) = document.select(&table_sel).nth(options.table_index) else {
        log::debug!("No table at index {}", options.table_index);
        return TableData::empty(options.has_header);
    };

    let mut rows: Vec<Vec<String>> = table
        .select(&row_sel)
        .map(|row| {
            row.select(&cell_sel)
                .map(|cell| strip_tags(&cell.inner_html()))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        log::debug!("Table {} has no rows", options.table_index);
        return TableData::empty(options.has_header);
    }

    if options.has_header {
        let headers = rows.remove(0);
        TableData::WithHeader { headers, rows }
    } else {
        TableData::Rows(rows)
    }
}

fn matches_filters(element: &ElementRef<'_>, filters: &[(&str, &str)]) -> bool {
    filters.iter().all(|(name, expected)| {
        let Some(actual) = element.value().attr(name) else {
            return false;
        };
        if *name == "class" {
            actual.split_whitespace().any(|token| token == *expected)
        } else {
            actual == *expected
        }
    })
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::debug!("Ignoring invalid pattern {:?}: {}", pattern, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head>
          <meta content="카페 소개" name="description">
          <meta property="og:title" content="  육아 카페  ">
        </head><body>
          <div class="post  main" id="p1"><p>첫&nbsp;문단</p> <b>둘째</b></div>
          <div class="post" id="p2">other</div>
          <a href="/ca-fe/cafes/1/articles/10"> 첫 글 </a>
          <a href="">empty</a>
          <a href="https://other.com/x">밖</a>
          <img src="//img.example.com/a.jpg" alt="사진">
          <img alt="no src">
          <table><tr><th>이름</th><th>값</th></tr><tr><td><b>a</b></td><td>1</td></tr></table>
          <table><tr><td>x</td></tr></table>
        </body></html>
    "#;

    const BASE: &str = "https://cafe.naver.com";

    #[test]
    fn test_extract_pattern() {
        assert_eq!(
            extract_pattern(PAGE, r#"id="(p\d)""#, 1),
            Some("p1".to_string())
        );
        assert_eq!(
            extract_all_patterns(PAGE, r#"id="(p\d)""#, 1),
            vec!["p1".to_string(), "p2".to_string()]
        );
        assert_eq!(extract_pattern(PAGE, r"nothing(\d+)", 1), None);
    }

    #[test]
    fn test_invalid_pattern_yields_empty() {
        assert_eq!(extract_pattern(PAGE, r"(unclosed", 1), None);
        assert!(extract_all_patterns(PAGE, r"(unclosed", 1).is_empty());
    }

    #[test]
    fn test_extract_meta_content_either_attribute_order() {
        assert_eq!(
            extract_meta_content(PAGE, "description"),
            Some("카페 소개".to_string())
        );
        assert_eq!(
            extract_meta_content(PAGE, "og:title"),
            Some("육아 카페".to_string())
        );
        assert_eq!(extract_meta_content(PAGE, "keywords"), None);
    }

    #[test]
    fn test_extract_element_with_class_token() {
        assert_eq!(
            extract_element(PAGE, "div", &[("class", "main")]),
            Some("첫 문단 둘째".to_string())
        );
        assert_eq!(
            extract_element(PAGE, "div", &[("class", "post"), ("id", "p2")]),
            Some("other".to_string())
        );
        assert_eq!(extract_element(PAGE, "div", &[("class", "missing")]), None);
    }

    #[test]
    fn test_extract_links_and_images() {
        let links = extract_links(PAGE, BASE);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "https://cafe.naver.com/ca-fe/cafes/1/articles/10");
        assert_eq!(links[0].text, "첫 글");
        assert_eq!(links[1].href, "https://other.com/x");

        let images = extract_images(PAGE, BASE);
        assert_eq!(
            images,
            vec![Image {
                src: "https://img.example.com/a.jpg".to_string(),
                alt: "사진".to_string()
            }]
        );
    }

    #[test]
    fn test_extract_table_data_with_header() {
        let data = extract_table_data(PAGE, TableOptions::default());
        assert_eq!(
            data,
            TableData::WithHeader {
                headers: vec!["이름".to_string(), "값".to_string()],
                rows: vec![vec!["a".to_string(), "1".to_string()]],
            }
        );
    }

    #[test]
    fn test_extract_table_data_without_header() {
        let data = extract_table_data(
            PAGE,
            TableOptions {
                has_header: false,
                table_index: 1,
            },
        );
        assert_eq!(data, TableData::Rows(vec![vec!["x".to_string()]]));
    }

    #[test]
    fn test_missing_table_yields_empty_shape() {
        let missing = TableOptions {
            has_header: true,
            table_index: 5,
        };
        assert!(matches!(
            extract_table_data(PAGE, missing),
            TableData::WithHeader { ref headers, ref rows } if headers.is_empty() && rows.is_empty()
        ));
        let data = extract_table_data(
            "<p>none</p>",
            TableOptions {
                has_header: false,
                table_index: 0,
            },
        );
        assert_eq!(data, TableData::Rows(Vec::new()));
    }
}
