// src/services/detail.rs

//! Post retrieval: API first, markup fallback, stub on total failure.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Config, DetailOptions, PostDetail, PostSummary, Retrieved, Source};
use crate::services::api::CafeApi;
use crate::services::html_detail::{HtmlDetail, HtmlDetailParser};
use crate::session::Session;
use crate::utils::Pacer;

/// Anything that can produce the full record of one post.
#[async_trait]
pub trait DetailSource: Send + Sync {
    /// A post that cannot be retrieved yields a stub with `error` set.
    /// `Err` is reserved for session faults.
    async fn fetch_detail(
        &self,
        summary: &PostSummary,
        options: &DetailOptions,
    ) -> Result<Retrieved<PostDetail>>;
}

/// Fetches posts of the configured cafe.
pub struct ArticleDetailService {
    config: Arc<Config>,
    session: Arc<dyn Session>,
    api: CafeApi,
    html: HtmlDetailParser,
}

impl ArticleDetailService {
    /// Create the service, compiling the configured selectors.
    pub fn new(
        config: Arc<Config>,
        session: Arc<dyn Session>,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self> {
        let html = HtmlDetailParser::new(&config)?;
        let api = CafeApi::new(Arc::clone(&config), Arc::clone(&session), pacer);
        Ok(Self {
            config,
            session,
            api,
            html,
        })
    }

    async fn fetch_html(&self, summary: &PostSummary) -> Result<Option<PostDetail>> {
        let url = if summary.url.is_empty() {
            self.config.cafe.article_url(&summary.id)
        } else {
            summary.url.clone()
        };
        let markup = self.session.navigate(&url).await?;
        let markup = match self.html.content_frame(&markup, &self.config.cafe.site_base) {
            Some(frame) => {
                log::debug!("Article {}: using content frame {}", summary.id, frame);
                self.session.navigate(&frame).await?
            }
            None => markup,
        };
        Ok(self
            .html
            .parse(&markup)
            .map(|found| merge_html(summary, found)))
    }
}

fn merge_html(summary: &PostSummary, found: HtmlDetail) -> PostDetail {
    let mut detail = PostDetail::from_summary(summary.clone());
    if let Some(title) = found.title.filter(|t| !t.is_empty()) {
        detail.summary.title = title;
    }
    if !found.comments.is_empty() {
        detail.summary.comment_count = found.comments.len() as u64;
    }
    detail.content = found.content;
    detail.images = found.images;
    detail.tags = found.tags;
    detail.comments = found.comments;
    detail
}

#[async_trait]
impl DetailSource for ArticleDetailService {
    async fn fetch_detail(
        &self,
        summary: &PostSummary,
        options: &DetailOptions,
    ) -> Result<Retrieved<PostDetail>> {
        let id = &summary.id;
        let mut last_error = String::from("no retrieval path attempted");

        if options.mode.tries_api() {
            match self.api.fetch_detail(summary).await {
                Ok(mut detail) => {
                    if !options.include_comments {
                        detail.comments.clear();
                    }
                    if !options.include_images {
                        detail.images.clear();
                    }
                    log::debug!("Article {}: detail from API", id);
                    return Ok(Retrieved::new(Source::Api, detail));
                }
                Err(e @ AppError::Session(_)) => return Err(e),
                Err(e) => {
                    log::warn!("Article {}: detail API failed: {}", id, e);
                    last_error = e.to_string();
                }
            }
        }

        if options.mode.allows_html() {
            match self.fetch_html(summary).await {
                Ok(Some(detail)) => {
                    log::debug!("Article {}: detail from markup", id);
                    return Ok(Retrieved::new(Source::Html, detail));
                }
                Ok(None) => {
                    log::warn!("Article {}: no post body found in markup", id);
                    last_error = "no post body found in markup".to_string();
                }
                Err(e @ AppError::Session(_)) => return Err(e),
                Err(e) => {
                    log::warn!("Article {}: markup fallback failed: {}", id, e);
                    last_error = e.to_string();
                }
            }
        }

        log::error!("Article {}: all retrieval paths failed", id);
        Ok(Retrieved::new(
            Source::None,
            PostDetail::failed(summary.clone(), last_error),
        ))
    }
}
