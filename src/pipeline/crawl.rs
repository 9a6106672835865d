// src/pipeline/crawl.rs

//! Full crawl: list, fetch in groups, write, checkpoint.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    BatchOptions, Config, CrawlCheckpoint, PaginationOptions, PostDetail, RetrievalMode,
};
use crate::pipeline::{fetch_details_in_batches, paginate};
use crate::services::{ArticleDetailService, ArticleListService, DetailSource, ListSource};
use crate::session::Session;
use crate::storage::{
    ArticleStorage, CheckpointStore, ChunkDocument, SummaryDocument, find_latest_id,
};
use crate::utils::text::truncate_graphemes;
use crate::utils::{Pacer, Pause};

/// Title length in progress lines, in grapheme clusters.
const PROGRESS_TITLE_LEN: usize = 30;

/// What a run did.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Summaries collected by pagination
    pub listed: usize,
    /// Posts written to chunk documents
    pub written: usize,
    /// Written posts that carry an `error`
    pub failed: usize,
    /// Posts left out by category
    pub excluded: usize,
    pub files: Vec<String>,
    /// Checkpoint ID stored at the end of the run
    pub last_article_id: Option<String>,
}

impl CrawlReport {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            listed: 0,
            written: 0,
            failed: 0,
            excluded: 0,
            files: Vec::new(),
            last_article_id: None,
        }
    }
}

/// How a run should treat the checkpoint and retrieval paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    pub mode: RetrievalMode,
    /// Ignore the stored checkpoint and list from the top
    pub fresh: bool,
}

/// The collaborators of one crawl.
pub struct Crawl<'a> {
    pub config: &'a Config,
    pub list: &'a dyn ListSource,
    pub detail: &'a dyn DetailSource,
    pub pacer: &'a dyn Pacer,
    pub storage: &'a dyn ArticleStorage,
    pub checkpoints: &'a CheckpointStore,
}

impl Crawl<'_> {
    pub async fn run(&self, options: CrawlOptions) -> Result<CrawlReport> {
        let mut report = CrawlReport::new();
        let crawler = &self.config.crawler;

        let checkpoint = if options.fresh {
            log::info!("Fresh run, ignoring checkpoint");
            CrawlCheckpoint::default()
        } else {
            self.checkpoints.load().await?
        };
        match checkpoint.resume_from() {
            Some(id) => log::info!("Resuming after article {}", id),
            None => log::info!("No checkpoint in effect, listing from the top"),
        }

        let pagination = PaginationOptions {
            last_article_id: checkpoint.resume_from().map(str::to_string),
            continue_from_last: checkpoint.resume_from().is_some(),
            ..PaginationOptions::from_config(self.config, options.mode)
        };
        let summaries = paginate(self.list, self.pacer, &pagination).await?;
        report.listed = summaries.len();

        if summaries.is_empty() {
            log::warn!("No posts to collect, nothing written");
            report.end_time = Utc::now();
            return Ok(report);
        }

        let batch = BatchOptions::from_config(self.config, options.mode);
        let group_size = crawler.articles_per_file.max(1);
        let group_count = summaries.len().div_ceil(group_size);
        let total = summaries.len();

        for (group_index, group) in summaries.chunks(group_size).enumerate() {
            let offset = group_index * group_size;
            log::info!(
                "Group {}/{}: posts {}-{}",
                group_index + 1,
                group_count,
                offset + 1,
                offset + group.len()
            );

            let details =
                fetch_details_in_batches(self.detail, self.pacer, group, &batch, |i, _, d| {
                    log_progress(offset + i, total, d)
                })
                .await;

            let before = details.len();
            let articles: Vec<PostDetail> = details
                .into_iter()
                .filter(|d| !is_excluded(d, &crawler.exclude_categories))
                .collect();
            report.excluded += before - articles.len();
            report.written += articles.len();
            report.failed += articles.iter().filter(|d| d.is_failed()).count();

            let doc = ChunkDocument { articles };
            let location = self
                .storage
                .write_chunk(offset + 1, offset + group.len(), &doc)
                .await?;
            report.files.push(location);

            if group_index + 1 < group_count {
                self.pacer.pause(Pause::BetweenGroups).await;
            }
        }

        report.last_article_id = find_latest_id(&summaries);
        match &report.last_article_id {
            Some(id) => self.checkpoints.persist(id).await?,
            None => log::warn!("No numeric article ID collected, checkpoint unchanged"),
        }

        let summary = SummaryDocument::new(
            &self.config.cafe.cafe_id,
            report.last_article_id.clone(),
            &summaries,
        );
        report.files.push(self.storage.write_summary(&summary).await?);

        report.end_time = Utc::now();
        log::info!(
            "Crawl complete: {} listed, {} written ({} failed, {} excluded) in {}s",
            report.listed,
            report.written,
            report.failed,
            report.excluded,
            (report.end_time - report.start_time).num_seconds()
        );
        Ok(report)
    }
}

/// Run a crawl against the cafe with the real list and detail services.
pub async fn run_crawler(
    config: Arc<Config>,
    session: Arc<dyn Session>,
    pacer: Arc<dyn Pacer>,
    storage: &dyn ArticleStorage,
    checkpoints: &CheckpointStore,
    options: CrawlOptions,
) -> Result<CrawlReport> {
    log::info!(
        "Crawling cafe {} (menu {}), target {} posts",
        config.cafe.cafe_id,
        config.cafe.menu_id,
        config.crawler.total_articles
    );
    let list = ArticleListService::new(
        Arc::clone(&config),
        Arc::clone(&session),
        Arc::clone(&pacer),
    )?;
    let detail = ArticleDetailService::new(Arc::clone(&config), session, Arc::clone(&pacer))?;

    Crawl {
        config: &config,
        list: &list,
        detail: &detail,
        pacer: pacer.as_ref(),
        storage,
        checkpoints,
    }
    .run(options)
    .await
}

fn is_excluded(detail: &PostDetail, exclude: &[String]) -> bool {
    let label = detail.category_label();
    !label.is_empty() && exclude.iter().any(|c| c == label)
}

fn log_progress(index: usize, total: usize, detail: &PostDetail) {
    let title = truncate_graphemes(detail.title(), PROGRESS_TITLE_LEN);
    match &detail.error {
        Some(error) => log::warn!(
            "[{}/{}] {} '{}' failed: {}",
            index,
            total,
            detail.id(),
            title,
            error
        ),
        None => log::info!(
            "[{}/{}] {} '{}' ({} comments)",
            index,
            total,
            detail.id(),
            title,
            detail.comments.len()
        ),
    }
}
