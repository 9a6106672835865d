// src/models/options.rs

//! Per-operation retrieval options.

use serde::{Deserialize, Serialize};

use crate::models::{Config, PostSummary};

/// Which retrieval path(s) to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// API first, markup fallback
    #[default]
    Auto,
    ApiOnly,
    HtmlOnly,
}

impl RetrievalMode {
    /// Map the two user intents onto a mode. Both set means `Auto`.
    pub fn from_flags(force_html: bool, force_api: bool) -> Self {
        match (force_html, force_api) {
            (true, true) => {
                log::warn!("Both force-html and force-api requested; using API with fallback");
                Self::Auto
            }
            (true, false) => Self::HtmlOnly,
            (false, true) => Self::ApiOnly,
            (false, false) => Self::Auto,
        }
    }

    pub fn tries_api(self) -> bool {
        !matches!(self, Self::HtmlOnly)
    }

    pub fn allows_html(self) -> bool {
        !matches!(self, Self::ApiOnly)
    }
}

/// Where a retrieved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Api,
    Html,
    /// Neither path produced a result
    None,
}

/// A value tagged with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved<T> {
    pub source: Source,
    pub data: T,
}

impl<T> Retrieved<T> {
    pub fn new(source: Source, data: T) -> Self {
        Self { source, data }
    }
}

/// One board page after incremental filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListPage {
    /// Posts kept, newest first
    pub posts: Vec<PostSummary>,
    /// Entries the board returned before filtering and truncation
    pub fetched: usize,
}

impl ListPage {
    pub fn new(posts: Vec<PostSummary>, fetched: usize) -> Self {
        Self { posts, fetched }
    }
}

/// Behavior when a resumed scan hits a page with no new posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeEmptyPolicy {
    /// Move on to the next page
    #[default]
    Continue,
    /// End pagination
    Stop,
}

/// Options for fetching one board page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    pub page_num: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub menu_id: String,
    pub mode: RetrievalMode,
    /// Truncate the result to this many entries
    pub required_count: usize,
    pub last_article_id: Option<String>,
    pub continue_from_last: bool,
}

impl ListOptions {
    /// Whether incremental filtering is active.
    pub fn resuming(&self) -> bool {
        self.continue_from_last
            && self
                .last_article_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_num: 1,
            page_size: 50,
            sort_by: "TIME".to_string(),
            menu_id: "0".to_string(),
            mode: RetrievalMode::Auto,
            required_count: 50,
            last_article_id: None,
            continue_from_last: false,
        }
    }
}

/// Options for scanning a range of board pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationOptions {
    pub start_page: u32,
    pub end_page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub menu_id: String,
    pub mode: RetrievalMode,
    pub total_required: usize,
    pub last_article_id: Option<String>,
    pub continue_from_last: bool,
    /// Pages per batch
    pub batch_size: usize,
    pub parallel: bool,
    pub resume_empty: ResumeEmptyPolicy,
}

impl PaginationOptions {
    /// Build from configuration, without a checkpoint.
    pub fn from_config(config: &Config, mode: RetrievalMode) -> Self {
        let crawler = &config.crawler;
        Self {
            start_page: crawler.start_page,
            end_page: crawler.effective_end_page(),
            page_size: crawler.page_size,
            sort_by: crawler.sort_by.clone(),
            menu_id: config.cafe.menu_id.clone(),
            mode,
            total_required: crawler.total_articles,
            last_article_id: None,
            continue_from_last: false,
            batch_size: crawler.page_batch_size,
            parallel: crawler.parallel,
            resume_empty: crawler.resume_empty,
        }
    }

    /// Options for one page of this scan.
    pub fn page(&self, page_num: u32, required_count: usize) -> ListOptions {
        ListOptions {
            page_num,
            page_size: self.page_size,
            sort_by: self.sort_by.clone(),
            menu_id: self.menu_id.clone(),
            mode: self.mode,
            required_count,
            last_article_id: self.last_article_id.clone(),
            continue_from_last: self.continue_from_last,
        }
    }
}

/// Options for fetching one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailOptions {
    pub mode: RetrievalMode,
    pub include_comments: bool,
    pub include_images: bool,
}

impl Default for DetailOptions {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Auto,
            include_comments: true,
            include_images: true,
        }
    }
}

/// Options for fetching many posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Posts per chunk
    pub batch_size: usize,
    /// One post at a time within a chunk
    pub safe_mode: bool,
    pub detail: DetailOptions,
}

impl BatchOptions {
    pub fn from_config(config: &Config, mode: RetrievalMode) -> Self {
        Self {
            batch_size: config.crawler.detail_batch_size,
            safe_mode: config.crawler.safe_mode,
            detail: DetailOptions {
                mode,
                include_comments: config.crawler.include_comments,
                include_images: config.crawler.include_images,
            },
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            safe_mode: true,
            detail: DetailOptions::default(),
        }
    }
}
