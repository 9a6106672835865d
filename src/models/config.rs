//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ResumeEmptyPolicy;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which cafe to crawl and where its endpoints live
    #[serde(default)]
    pub cafe: CafeConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Pacing windows
    #[serde(default)]
    pub delay: DelayConfig,

    /// Selector cascades for the markup fallback paths
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Output and state file locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.cafe.cafe_id.trim().is_empty() {
            return Err(AppError::validation("cafe.cafe_id is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.page_size == 0 || self.crawler.page_size > MAX_API_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "crawler.page_size must be between 1 and {MAX_API_PAGE_SIZE}"
            )));
        }
        if self.crawler.start_page == 0 {
            return Err(AppError::validation("crawler.start_page must be >= 1"));
        }
        if let Some(end) = self.crawler.end_page {
            if end < self.crawler.start_page {
                return Err(AppError::validation(
                    "crawler.end_page must not be before crawler.start_page",
                ));
            }
        }
        if self.crawler.page_batch_size == 0 || self.crawler.detail_batch_size == 0 {
            return Err(AppError::validation("crawler batch sizes must be > 0"));
        }
        if self.crawler.articles_per_file == 0 {
            return Err(AppError::validation(
                "crawler.articles_per_file must be > 0",
            ));
        }
        if self.selectors.list_rows.is_empty() || self.selectors.content.is_empty() {
            return Err(AppError::validation(
                "selectors.list_rows and selectors.content need at least one entry",
            ));
        }
        Ok(())
    }
}

/// The API refuses page sizes above this.
pub const MAX_API_PAGE_SIZE: u32 = 50;

/// Target cafe and endpoint bases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CafeConfig {
    /// Numeric club identifier
    #[serde(default = "defaults::cafe_id")]
    pub cafe_id: String,

    /// Board menu to crawl ("0" is the all-posts board)
    #[serde(default = "defaults::menu_id")]
    pub menu_id: String,

    /// Board page used by the markup fallback
    #[serde(default = "defaults::cafe_url")]
    pub cafe_url: String,

    /// Base of the JSON API
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Base of the public site, used for post links and referers
    #[serde(default = "defaults::site_base")]
    pub site_base: String,
}

impl Default for CafeConfig {
    fn default() -> Self {
        Self {
            cafe_id: defaults::cafe_id(),
            menu_id: defaults::menu_id(),
            cafe_url: defaults::cafe_url(),
            api_base: defaults::api_base(),
            site_base: defaults::site_base(),
        }
    }
}

impl CafeConfig {
    /// Public link of a post.
    pub fn article_url(&self, article_id: &str) -> String {
        format!(
            "{}/ca-fe/cafes/{}/articles/{}",
            self.site_base.trim_end_matches('/'),
            self.cafe_id,
            article_id
        )
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of posts to collect per run
    #[serde(default = "defaults::total_articles")]
    pub total_articles: usize,

    /// Posts per output document
    #[serde(default = "defaults::articles_per_file")]
    pub articles_per_file: usize,

    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Last page to scan; derived from `total_articles` when unset
    #[serde(default)]
    pub end_page: Option<u32>,

    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Pages per pagination batch
    #[serde(default = "defaults::batch_size")]
    pub page_batch_size: usize,

    /// Posts per detail chunk
    #[serde(default = "defaults::batch_size")]
    pub detail_batch_size: usize,

    /// Fetch the pages of a batch concurrently
    #[serde(default = "defaults::enabled")]
    pub parallel: bool,

    /// Fetch the posts of a chunk one at a time
    #[serde(default = "defaults::enabled")]
    pub safe_mode: bool,

    #[serde(default = "defaults::sort_by")]
    pub sort_by: String,

    #[serde(default = "defaults::enabled")]
    pub include_comments: bool,

    #[serde(default = "defaults::enabled")]
    pub include_images: bool,

    /// Categories whose posts are left out of the output documents
    #[serde(default)]
    pub exclude_categories: Vec<String>,

    /// What to do with a page that has no new posts while resuming
    #[serde(default)]
    pub resume_empty: ResumeEmptyPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            total_articles: defaults::total_articles(),
            articles_per_file: defaults::articles_per_file(),
            start_page: defaults::start_page(),
            end_page: None,
            page_size: defaults::page_size(),
            page_batch_size: defaults::batch_size(),
            detail_batch_size: defaults::batch_size(),
            parallel: defaults::enabled(),
            safe_mode: defaults::enabled(),
            sort_by: defaults::sort_by(),
            include_comments: defaults::enabled(),
            include_images: defaults::enabled(),
            exclude_categories: Vec::new(),
            resume_empty: ResumeEmptyPolicy::default(),
        }
    }
}

impl CrawlerConfig {
    /// Configured last page, or enough pages for `total_articles` plus slack.
    pub fn effective_end_page(&self) -> u32 {
        self.end_page.unwrap_or_else(|| {
            let page_size = self.page_size.max(1) as usize;
            let required = self.total_articles.div_ceil(page_size) as u32;
            self.start_page + required.max(1) + 2
        })
    }
}

/// Pacing windows in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Base window, used after requests and between pages
    #[serde(default = "defaults::delay_min")]
    pub min_ms: u64,
    #[serde(default = "defaults::delay_max")]
    pub max_ms: u64,

    /// Window between detail chunks
    #[serde(default = "defaults::batch_min")]
    pub batch_min_ms: u64,
    #[serde(default = "defaults::batch_max")]
    pub batch_max_ms: u64,

    /// Window between posts of a safe-mode chunk
    #[serde(default = "defaults::item_min")]
    pub item_min_ms: u64,
    #[serde(default = "defaults::item_max")]
    pub item_max_ms: u64,

    /// Window after each post re-processed on the fallback path
    #[serde(default = "defaults::retry_item_min")]
    pub retry_item_min_ms: u64,
    #[serde(default = "defaults::retry_item_max")]
    pub retry_item_max_ms: u64,

    /// Fixed wait before retrying a 5xx API response
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            min_ms: defaults::delay_min(),
            max_ms: defaults::delay_max(),
            batch_min_ms: defaults::batch_min(),
            batch_max_ms: defaults::batch_max(),
            item_min_ms: defaults::item_min(),
            item_max_ms: defaults::item_max(),
            retry_item_min_ms: defaults::retry_item_min(),
            retry_item_max_ms: defaults::retry_item_max(),
            retry_backoff_ms: defaults::retry_backoff(),
        }
    }
}

impl DelayConfig {
    /// A configuration that never waits.
    pub fn none() -> Self {
        Self {
            min_ms: 0,
            max_ms: 0,
            batch_min_ms: 0,
            batch_max_ms: 0,
            item_min_ms: 0,
            item_max_ms: 0,
            retry_item_min_ms: 0,
            retry_item_max_ms: 0,
            retry_backoff_ms: 0,
        }
    }
}

/// Ordered selector cascades. The first entry of each list is the primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Embedded frame holding the board or post document
    #[serde(default = "defaults::content_frame")]
    pub content_frame: String,

    /// Row selectors of the board list
    #[serde(default = "defaults::list_rows")]
    pub list_rows: Vec<String>,

    /// Bare post-link selector used when no row selector matches
    #[serde(default = "defaults::list_link")]
    pub list_link: String,

    #[serde(default = "defaults::list_title")]
    pub list_title: Vec<String>,
    #[serde(default = "defaults::list_author")]
    pub list_author: Vec<String>,
    #[serde(default = "defaults::list_date")]
    pub list_date: Vec<String>,
    #[serde(default = "defaults::list_views")]
    pub list_views: Vec<String>,
    #[serde(default = "defaults::list_comments")]
    pub list_comments: Vec<String>,

    /// Post title on the detail page
    #[serde(default = "defaults::title")]
    pub title: Vec<String>,

    /// Post body on the detail page
    #[serde(default = "defaults::content")]
    pub content: Vec<String>,

    #[serde(default = "defaults::comment_container")]
    pub comment_container: Vec<String>,
    #[serde(default = "defaults::comment_item")]
    pub comment_item: Vec<String>,
    #[serde(default = "defaults::comment_author")]
    pub comment_author: Vec<String>,
    #[serde(default = "defaults::comment_date")]
    pub comment_date: Vec<String>,
    #[serde(default = "defaults::comment_content")]
    pub comment_content: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            content_frame: defaults::content_frame(),
            list_rows: defaults::list_rows(),
            list_link: defaults::list_link(),
            list_title: defaults::list_title(),
            list_author: defaults::list_author(),
            list_date: defaults::list_date(),
            list_views: defaults::list_views(),
            list_comments: defaults::list_comments(),
            title: defaults::title(),
            content: defaults::content(),
            comment_container: defaults::comment_container(),
            comment_item: defaults::comment_item(),
            comment_author: defaults::comment_author(),
            comment_date: defaults::comment_date(),
            comment_content: defaults::comment_content(),
        }
    }
}

/// File locations, relative to the storage directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// `KEY=value` file holding the resume checkpoint
    #[serde(default = "defaults::checkpoint_file")]
    pub checkpoint_file: PathBuf,

    /// Cookie jar exported from a logged-in browser
    #[serde(default = "defaults::cookie_file")]
    pub cookie_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            checkpoint_file: defaults::checkpoint_file(),
            cookie_file: defaults::cookie_file(),
        }
    }
}

impl PathsConfig {
    /// Resolve every relative path against `root`.
    pub fn rooted(&self, root: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        };
        Self {
            output_dir: join(&self.output_dir),
            checkpoint_file: join(&self.checkpoint_file),
            cookie_file: join(&self.cookie_file),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Cafe defaults
    pub fn cafe_id() -> String {
        "23529966".into()
    }
    pub fn menu_id() -> String {
        "0".into()
    }
    pub fn cafe_url() -> String {
        "https://cafe.naver.com/f-e/cafes/23529966/menus/0".into()
    }
    pub fn api_base() -> String {
        "https://apis.naver.com".into()
    }
    pub fn site_base() -> String {
        "https://cafe.naver.com".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn total_articles() -> usize {
        30
    }
    pub fn articles_per_file() -> usize {
        10
    }
    pub fn start_page() -> u32 {
        1
    }
    pub fn page_size() -> u32 {
        50
    }
    pub fn batch_size() -> usize {
        5
    }
    pub fn enabled() -> bool {
        true
    }
    pub fn sort_by() -> String {
        "TIME".into()
    }

    // Delay defaults
    pub fn delay_min() -> u64 {
        2000
    }
    pub fn delay_max() -> u64 {
        5000
    }
    pub fn batch_min() -> u64 {
        1500
    }
    pub fn batch_max() -> u64 {
        3000
    }
    pub fn item_min() -> u64 {
        1000
    }
    pub fn item_max() -> u64 {
        2000
    }
    pub fn retry_item_min() -> u64 {
        2000
    }
    pub fn retry_item_max() -> u64 {
        3000
    }
    pub fn retry_backoff() -> u64 {
        5000
    }

    // Selector defaults
    pub fn content_frame() -> String {
        "iframe#cafe_main".into()
    }
    pub fn list_rows() -> Vec<String> {
        strings(&[
            ".article-board-list tr:not(.notice)",
            ".board-list tr",
            ".article_wrap",
            "li.article-list",
            "tr[data-article-id]",
            ".article-item",
            ".article-board-list tr",
        ])
    }
    pub fn list_link() -> String {
        "a.article".into()
    }
    pub fn list_title() -> Vec<String> {
        strings(&[
            ".article",
            "a.article_title",
            "a.tit",
            "h3 a",
            "a[href*=\"articles\"]",
        ])
    }
    pub fn list_author() -> Vec<String> {
        strings(&[
            ".td_name .p-nick",
            ".p-nick",
            ".td_name",
            ".author",
            ".nickname",
            ".writer",
            ".user",
        ])
    }
    pub fn list_date() -> Vec<String> {
        strings(&[".td_date", ".date", ".time", ".timestamp"])
    }
    pub fn list_views() -> Vec<String> {
        strings(&[".td_view", ".view", ".hit", ".count"])
    }
    pub fn list_comments() -> Vec<String> {
        strings(&[".CommentItem", ".comment_area", ".cmt"])
    }
    pub fn title() -> Vec<String> {
        strings(&[
            ".tit-box h3",
            ".article_header h3",
            ".title_text",
            ".article_subject",
            "h3.title",
        ])
    }
    pub fn content() -> Vec<String> {
        strings(&[
            ".se-main-container",
            ".content",
            ".article_body",
            ".se-module-text",
            ".ContentRenderer",
            ".content_view",
            "#tbody",
            ".se-content",
            ".article_text",
            ".article-content",
            ".se-viewer",
            ".ArticleContentBox",
            ".ArticleContent",
            ".article_container",
            ".ArticleContentBox .content",
            ".ArticleContentBox div[class*=\"content\"]",
            "div[class*=\"ArticleContent\"]",
        ])
    }
    pub fn comment_container() -> Vec<String> {
        strings(&[
            ".comment_list",
            "#cmt_list",
            ".CommentList",
            ".comment_box",
            "#cmtList",
        ])
    }
    pub fn comment_item() -> Vec<String> {
        strings(&[".CommentItem", "li.comment", ".comment_item"])
    }
    pub fn comment_author() -> Vec<String> {
        strings(&[
            ".comment_nick_info",
            ".comment_nickname",
            ".comment_inbox_name",
            ".nick",
            ".author",
            ".user_name",
        ])
    }
    pub fn comment_date() -> Vec<String> {
        strings(&[
            ".comment_info_date",
            ".date",
            ".time",
            ".timestamp",
            ".comment_date",
        ])
    }
    pub fn comment_content() -> Vec<String> {
        strings(&[
            ".comment_text_box",
            ".comment_text_view",
            ".comment_inbox_text",
            ".text",
            ".comment_text",
            ".content",
        ])
    }

    // Path defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("output")
    }
    pub fn checkpoint_file() -> PathBuf {
        PathBuf::from("checkpoint.env")
    }
    pub fn cookie_file() -> PathBuf {
        PathBuf::from("cookies.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_page() {
        let mut config = Config::default();
        config.crawler.page_size = 51;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_page_range() {
        let mut config = Config::default();
        config.crawler.start_page = 5;
        config.crawler.end_page = Some(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cafe]
            cafe_id = "123"

            [crawler]
            total_articles = 120
            exclude_categories = ["공지사항"]
            "#,
        )
        .unwrap();
        assert_eq!(config.cafe.cafe_id, "123");
        assert_eq!(config.cafe.api_base, "https://apis.naver.com");
        assert_eq!(config.crawler.total_articles, 120);
        assert_eq!(config.crawler.page_size, 50);
        assert_eq!(config.crawler.exclude_categories, vec!["공지사항"]);
        assert_eq!(config.delay.retry_backoff_ms, 5000);
        assert_eq!(config.selectors.list_rows[0], ".article-board-list tr:not(.notice)");
    }

    #[test]
    fn effective_end_page_derives_from_total() {
        let mut crawler = CrawlerConfig::default();
        crawler.total_articles = 120;
        assert_eq!(crawler.effective_end_page(), 1 + 3 + 2);
        crawler.end_page = Some(4);
        assert_eq!(crawler.effective_end_page(), 4);
    }

    #[test]
    fn article_url_uses_site_base() {
        let cafe = CafeConfig::default();
        assert_eq!(
            cafe.article_url("42"),
            "https://cafe.naver.com/ca-fe/cafes/23529966/articles/42"
        );
    }

    #[test]
    fn paths_are_rooted() {
        let paths = PathsConfig::default().rooted(Path::new("/data"));
        assert_eq!(paths.output_dir, PathBuf::from("/data/output"));
        assert_eq!(paths.checkpoint_file, PathBuf::from("/data/checkpoint.env"));
    }
}
