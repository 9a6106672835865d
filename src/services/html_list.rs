// src/services/html_list.rs

//! Board listing extraction from page markup.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{Config, PostSummary};
use crate::parser::{Cascade, EachStrategy, parse_selector};
use crate::utils::text::{clean_text, parse_count};
use crate::utils::url::{extract_article_id, resolve_url};

/// Frames found on a board page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSources {
    /// The dedicated content frame, when present
    pub content: Option<String>,
    /// Every other frame, in document order
    pub others: Vec<String>,
}

/// Per-row field cascades shared by the row strategies.
struct RowFields {
    title: Cascade<String>,
    author: Cascade<String>,
    date: Cascade<String>,
    views: Cascade<String>,
    comments: Cascade<String>,
    title_links: Vec<Selector>,
    any_link: Selector,
    site_base: String,
}

impl RowFields {
    fn parse_row(&self, row: ElementRef<'_>) -> Option<PostSummary> {
        let href = self
            .title_links
            .iter()
            .find_map(|sel| row.select(sel).find_map(|el| el.value().attr("href")))
            .or_else(|| row.select(&self.any_link).find_map(|a| a.value().attr("href")))?;
        let url = resolve_url(href.trim(), &self.site_base);
        if url.is_empty() {
            return None;
        }

        let title = self.title.value(row)?;
        Some(PostSummary {
            id: extract_article_id(&url),
            title,
            author: self.author.value(row).unwrap_or_default(),
            date: self.date.value(row).unwrap_or_default(),
            view_count: self.views.value(row).map(|v| parse_count(&v)).unwrap_or(0),
            comment_count: self
                .comments
                .value(row)
                .map(|c| parse_count(&c))
                .unwrap_or(0),
            url,
            menu_name: None,
            summary: None,
        })
    }

    fn parse_link(&self, link: ElementRef<'_>) -> Option<PostSummary> {
        let href = link.value().attr("href")?;
        let url = resolve_url(href.trim(), &self.site_base);
        let title = clean_text(&link.text().collect::<String>());
        if url.is_empty() || title.is_empty() {
            return None;
        }
        Some(PostSummary {
            id: extract_article_id(&url),
            title,
            author: String::new(),
            date: String::new(),
            view_count: 0,
            comment_count: 0,
            url,
            menu_name: None,
            summary: None,
        })
    }
}

/// Compiled selectors for reading a board page.
pub struct HtmlListParser {
    rows: Cascade<Vec<PostSummary>>,
    primary_rows: Selector,
    frame: Selector,
    any_frame: Selector,
    site_base: String,
}

impl HtmlListParser {
    /// Compile the configured selectors. An invalid selector is an error.
    pub fn new(config: &Config) -> Result<Self> {
        let selectors = &config.selectors;
        let fields = Arc::new(RowFields {
            title: Cascade::text("list title", &selectors.list_title)?,
            author: Cascade::text("list author", &selectors.list_author)?,
            date: Cascade::text("list date", &selectors.list_date)?,
            views: Cascade::text("list views", &selectors.list_views)?,
            comments: Cascade::text("list comments", &selectors.list_comments)?,
            title_links: selectors
                .list_title
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_>>()?,
            any_link: parse_selector("a[href]")?,
            site_base: config.cafe.site_base.clone(),
        });

        let mut rows = Cascade::new("list rows");
        for selector in &selectors.list_rows {
            let fields = Arc::clone(&fields);
            rows = rows.then(EachStrategy::new(selector, move |row| fields.parse_row(row))?);
        }
        let link_fields = Arc::clone(&fields);
        rows = rows.then(EachStrategy::new(&selectors.list_link, move |link| {
            link_fields.parse_link(link)
        })?);

        let primary = selectors
            .list_rows
            .first()
            .map(String::as_str)
            .unwrap_or("tr");

        Ok(Self {
            rows,
            primary_rows: parse_selector(primary)?,
            frame: parse_selector(&selectors.content_frame)?,
            any_frame: parse_selector("iframe[src]")?,
            site_base: config.cafe.site_base.clone(),
        })
    }

    /// Locate embedded frames, resolving their sources.
    pub fn frames(&self, markup: &str) -> FrameSources {
        let document = Html::parse_document(markup);
        let src_of = |el: ElementRef<'_>| {
            el.value()
                .attr("src")
                .map(|src| resolve_url(src.trim(), &self.site_base))
                .filter(|src| !src.is_empty())
        };

        let content = document.select(&self.frame).find_map(src_of);
        let others = document
            .select(&self.any_frame)
            .filter_map(src_of)
            .filter(|src| Some(src) != content.as_ref())
            .collect();
        FrameSources { content, others }
    }

    /// Whether the primary row selector matches anything.
    pub fn has_primary_rows(&self, markup: &str) -> bool {
        let document = Html::parse_document(markup);
        document.select(&self.primary_rows).next().is_some()
    }

    /// Post summaries of a board page, in document order.
    pub fn parse_rows(&self, markup: &str) -> Vec<PostSummary> {
        let document = Html::parse_document(markup);
        match self.rows.run(document.root_element()) {
            Some(hit) => {
                log::debug!("Found {} rows with '{}'", hit.value.len(), hit.label);
                hit.value
            }
            None => {
                log::warn!("No post rows found on the board page");
                Vec::new()
            }
        }
    }
}

/// Board page URL for a page number.
pub fn board_page_url(cafe_url: &str, page: u32) -> String {
    let separator = if cafe_url.contains('?') { '&' } else { '?' };
    format!("{cafe_url}{separator}page={page}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE_BOARD: &str = r#"
        <table class="article-board-list">
          <tr class="notice"><td><a class="article" href="/ca-fe/cafes/1/articles/1">공지</a></td></tr>
          <tr>
            <td><a class="article" href="/ca-fe/cafes/1/articles/120"> 새 글 </a></td>
            <td class="td_name"><span class="p-nick">엄마1</span></td>
            <td class="td_date">2024.01.02.</td>
            <td class="td_view">1,204</td>
          </tr>
          <tr>
            <td><a class="article" href="https://cafe.naver.com/ArticleRead.nhn?clubid=1&articleid=119">둘째 글</a></td>
            <td class="td_date">10:30</td>
          </tr>
        </table>
    "#;

    const CARD_BOARD: &str = r#"
        <ul>
          <li class="article-list">
            <a class="tit" href="/ca-fe/cafes/1/articles/77">카드 글</a>
            <span class="nickname">아빠</span><span class="date">2024.02.01.</span>
            <span class="hit">조회 33</span>
          </li>
        </ul>
    "#;

    const LINKS_ONLY: &str = r#"
        <div><a class="article" href="/ca-fe/cafes/1/articles/55">링크 글</a></div>
    "#;

    fn parser() -> HtmlListParser {
        HtmlListParser::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_primary_rows_skip_notices() {
        let posts = parser().parse_rows(TABLE_BOARD);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "120");
        assert_eq!(posts[0].title, "새 글");
        assert_eq!(posts[0].author, "엄마1");
        assert_eq!(posts[0].date, "2024.01.02.");
        assert_eq!(posts[0].view_count, 1204);
        assert_eq!(posts[0].url, "https://cafe.naver.com/ca-fe/cafes/1/articles/120");
        assert_eq!(posts[1].id, "119");
        assert_eq!(posts[1].author, "");
    }

    #[test]
    fn test_alternative_rows() {
        let posts = parser().parse_rows(CARD_BOARD);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "77");
        assert_eq!(posts[0].title, "카드 글");
        assert_eq!(posts[0].author, "아빠");
        assert_eq!(posts[0].view_count, 33);
    }

    #[test]
    fn test_bare_link_fallback() {
        let posts = parser().parse_rows(LINKS_ONLY);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "55");
        assert_eq!(posts[0].title, "링크 글");
    }

    #[test]
    fn test_no_rows_is_empty() {
        assert!(parser().parse_rows("<p>로그인이 필요합니다</p>").is_empty());
    }

    #[test]
    fn test_frames() {
        let markup = r#"
            <iframe src="/ad/banner"></iframe>
            <iframe id="cafe_main" src="/ArticleList.nhn?search.clubid=1"></iframe>
        "#;
        let frames = parser().frames(markup);
        assert_eq!(
            frames.content.as_deref(),
            Some("https://cafe.naver.com/ArticleList.nhn?search.clubid=1")
        );
        assert_eq!(frames.others, vec!["https://cafe.naver.com/ad/banner".to_string()]);
        assert!(parser().has_primary_rows(TABLE_BOARD));
        assert!(!parser().has_primary_rows(CARD_BOARD));
    }

    #[test]
    fn test_board_page_url() {
        assert_eq!(
            board_page_url("https://cafe.naver.com/f-e/cafes/1/menus/0", 3),
            "https://cafe.naver.com/f-e/cafes/1/menus/0?page=3"
        );
        assert_eq!(
            board_page_url("https://cafe.naver.com/x?menu=1", 2),
            "https://cafe.naver.com/x?menu=1&page=2"
        );
    }
}
