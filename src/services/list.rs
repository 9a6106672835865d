// src/services/list.rs

//! Board page retrieval: API first, markup fallback, incremental filtering.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, ListOptions, ListPage, PostSummary, Retrieved, Source};
use crate::services::api::CafeApi;
use crate::services::html_list::{HtmlListParser, board_page_url};
use crate::session::Session;
use crate::utils::Pacer;

/// Anything that can produce one page of post summaries.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// `Err` only for faults that make further pages pointless, such as an
    /// unusable session. Page-level failures yield an empty page.
    async fn fetch_page(&self, options: &ListOptions) -> Result<Retrieved<ListPage>>;
}

/// Keep posts newer than `last_article_id`.
///
/// Posts without a numeric ID are kept. A non-numeric `last_article_id`
/// disables filtering.
pub fn filter_newer(posts: Vec<PostSummary>, last_article_id: &str) -> Vec<PostSummary> {
    let Ok(last) = last_article_id.trim().parse::<u64>() else {
        log::warn!(
            "Last article ID {:?} is not numeric; skipping incremental filter",
            last_article_id
        );
        return posts;
    };
    posts
        .into_iter()
        .filter(|post| post.numeric_id().is_none_or(|id| id > last))
        .collect()
}

/// Fetches board pages for the configured cafe.
pub struct ArticleListService {
    config: Arc<Config>,
    session: Arc<dyn Session>,
    api: CafeApi,
    html: HtmlListParser,
}

impl ArticleListService {
    /// Create the service, compiling the configured selectors.
    pub fn new(
        config: Arc<Config>,
        session: Arc<dyn Session>,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self> {
        let html = HtmlListParser::new(&config)?;
        let api = CafeApi::new(Arc::clone(&config), Arc::clone(&session), pacer);
        Ok(Self {
            config,
            session,
            api,
            html,
        })
    }

    /// Fetch a board page through the markup path.
    async fn fetch_html(&self, options: &ListOptions) -> Result<Vec<PostSummary>> {
        let page_url = board_page_url(&self.config.cafe.cafe_url, options.page_num);
        let markup = self.session.navigate(&page_url).await?;
        let frames = self.html.frames(&markup);

        let document = match frames.content {
            Some(src) => {
                log::debug!("Using content frame {}", src);
                self.session.navigate(&src).await?
            }
            None => {
                let mut chosen = None;
                for src in frames.others {
                    match self.session.navigate(&src).await {
                        Ok(frame) if self.html.has_primary_rows(&frame) => {
                            log::debug!("Using frame {} with post rows", src);
                            chosen = Some(frame);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => log::debug!("Frame {} could not be loaded: {}", src, e),
                    }
                }
                chosen.unwrap_or(markup)
            }
        };

        Ok(self.html.parse_rows(&document))
    }
}

#[async_trait]
impl ListSource for ArticleListService {
    async fn fetch_page(&self, options: &ListOptions) -> Result<Retrieved<ListPage>> {
        let page = options.page_num;
        let mut source = Source::None;
        let mut posts = Vec::new();

        if options.mode.tries_api() {
            match self.api.fetch_list(options).await {
                Ok(found) if !found.is_empty() => {
                    log::info!("Page {}: {} posts from API", page, found.len());
                    source = Source::Api;
                    posts = found;
                }
                Ok(_) => log::info!("Page {}: API returned no posts", page),
                Err(e @ AppError::Session(_)) => return Err(e),
                Err(e) => log::warn!("Page {}: list API failed: {}", page, e),
            }
        }

        if posts.is_empty() && options.mode.allows_html() {
            match self.fetch_html(options).await {
                Ok(found) => {
                    log::info!("Page {}: {} posts from markup", page, found.len());
                    if !found.is_empty() {
                        source = Source::Html;
                    }
                    posts = found;
                }
                Err(e @ AppError::Session(_)) => return Err(e),
                Err(e) => log::warn!("Page {}: markup fallback failed: {}", page, e),
            }
        }

        let fetched = posts.len();
        if options.resuming() {
            let last = options.last_article_id.as_deref().unwrap_or_default();
            posts = filter_newer(posts, last);
            log::info!(
                "Page {}: {} of {} posts are newer than {}",
                page,
                posts.len(),
                fetched,
                last
            );
        }

        posts.truncate(options.required_count);
        Ok(Retrieved::new(source, ListPage::new(posts, fetched)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::models::RetrievalMode;
    use crate::session::{Cookie, HttpResponse};
    use crate::utils::NoopPacer;

    fn post(id: &str) -> PostSummary {
        PostSummary {
            id: id.to_string(),
            title: id.to_string(),
            author: String::new(),
            date: String::new(),
            view_count: 0,
            comment_count: 0,
            url: String::new(),
            menu_name: None,
            summary: None,
        }
    }

    fn ids(posts: &[PostSummary]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_filter_newer_keeps_larger_ids() {
        let posts = vec![post("300"), post("200"), post("150"), post("100")];
        assert_eq!(ids(&filter_newer(posts, "150")), vec!["300", "200"]);
    }

    #[test]
    fn test_filter_newer_is_fail_open() {
        let posts = vec![post("unknown-1700"), post("100"), post("abc"), post("300")];
        assert_eq!(
            ids(&filter_newer(posts, "200")),
            vec!["unknown-1700", "abc", "300"]
        );
    }

    #[test]
    fn test_filter_newer_non_numeric_checkpoint_disables_filter() {
        let posts = vec![post("1"), post("2")];
        assert_eq!(ids(&filter_newer(posts, "latest")), vec!["1", "2"]);
    }

    /// Serves fixed bodies keyed by URL prefix; unknown URLs get a 404.
    struct RoutedSession {
        routes: HashMap<&'static str, HttpResponse>,
        hits: Mutex<Vec<String>>,
    }

    impl RoutedSession {
        fn new(routes: Vec<(&'static str, u16, String)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(prefix, status, body)| (prefix, HttpResponse { status, body }))
                    .collect(),
                hits: Mutex::new(Vec::new()),
            }
        }

        fn hits(&self) -> Vec<String> {
            self.hits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Session for RoutedSession {
        fn cookies(&self, _url: &str) -> Result<Vec<Cookie>> {
            Ok(vec![Cookie::new("a", "b")])
        }

        async fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<HttpResponse> {
            self.hits.lock().unwrap().push(url.to_string());
            Ok(self
                .routes
                .iter()
                .find(|(prefix, _)| url.starts_with(*prefix))
                .map(|(_, r)| r.clone())
                .unwrap_or(HttpResponse {
                    status: 404,
                    body: String::new(),
                }))
        }

        async fn navigate(&self, url: &str) -> Result<String> {
            let response = self.get(url, &[]).await?;
            if response.is_success() {
                Ok(response.body)
            } else {
                Err(AppError::api(url, response.status))
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    const LIST_API: &str = "https://apis.naver.com/cafe-web/cafe-boardlist-api";
    const BOARD: &str = "https://cafe.naver.com/f-e/cafes/23529966/menus/0?page=";
    const FRAME: &str = "https://cafe.naver.com/ArticleList.nhn";

    fn api_body(ids: &[u64]) -> String {
        let list: Vec<_> = ids
            .iter()
            .map(|id| json!({"type": "ARTICLE", "item": {"articleId": id, "subject": "t"}}))
            .collect();
        json!({"result": {"articleList": list}}).to_string()
    }

    fn board_markup(ids: &[u64]) -> String {
        let rows: String = ids
            .iter()
            .map(|id| {
                format!(
                    r#"<tr><td><a class="article" href="/ca-fe/cafes/1/articles/{id}">글 {id}</a></td></tr>"#
                )
            })
            .collect();
        format!(r#"<table class="article-board-list">{rows}</table>"#)
    }

    fn service(session: Arc<RoutedSession>) -> ArticleListService {
        ArticleListService::new(Arc::new(Config::default()), session, Arc::new(NoopPacer)).unwrap()
    }

    #[tokio::test]
    async fn test_api_success_skips_markup() {
        let session = Arc::new(RoutedSession::new(vec![(LIST_API, 200, api_body(&[5, 4, 3]))]));
        let result = service(session.clone())
            .fetch_page(&ListOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, Source::Api);
        assert_eq!(ids(&result.data.posts), vec!["5", "4", "3"]);
        assert_eq!(result.data.fetched, 3);
        assert!(session.hits().iter().all(|u| u.starts_with(LIST_API)));
    }

    #[tokio::test]
    async fn test_empty_api_falls_back_to_frame() {
        let session = Arc::new(RoutedSession::new(vec![
            (LIST_API, 200, api_body(&[])),
            (
                BOARD,
                200,
                r#"<iframe id="cafe_main" src="/ArticleList.nhn?clubid=1"></iframe>"#.to_string(),
            ),
            (FRAME, 200, board_markup(&[9, 8])),
        ]));
        let result = service(session)
            .fetch_page(&ListOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, Source::Html);
        assert_eq!(ids(&result.data.posts), vec!["9", "8"]);
    }

    #[tokio::test]
    async fn test_api_only_never_touches_markup() {
        let session = Arc::new(RoutedSession::new(vec![(LIST_API, 500, String::new())]));
        let options = ListOptions {
            mode: RetrievalMode::ApiOnly,
            ..ListOptions::default()
        };
        let result = service(session.clone()).fetch_page(&options).await.unwrap();
        assert_eq!(result.source, Source::None);
        assert!(result.data.posts.is_empty());
        assert!(session.hits().iter().all(|u| u.starts_with(LIST_API)));
    }

    #[tokio::test]
    async fn test_html_only_filters_and_truncates() {
        let session = Arc::new(RoutedSession::new(vec![
            (LIST_API, 200, api_body(&[1])),
            (BOARD, 200, board_markup(&[210, 205, 200, 190])),
        ]));
        let options = ListOptions {
            mode: RetrievalMode::HtmlOnly,
            required_count: 1,
            last_article_id: Some("199".to_string()),
            continue_from_last: true,
            ..ListOptions::default()
        };
        let result = service(session.clone()).fetch_page(&options).await.unwrap();
        assert_eq!(result.source, Source::Html);
        assert_eq!(ids(&result.data.posts), vec!["210"]);
        // the raw row count survives filtering and truncation
        assert_eq!(result.data.fetched, 4);
        assert!(session.hits().iter().all(|u| !u.starts_with(LIST_API)));
    }

    #[tokio::test]
    async fn test_both_paths_failing_yields_empty() {
        let session = Arc::new(RoutedSession::new(Vec::new()));
        let result = service(session)
            .fetch_page(&ListOptions::default())
            .await
            .unwrap();
        assert_eq!(result.source, Source::None);
        assert_eq!(result.data, ListPage::default());
    }
}
