// src/pipeline/paginate.rs

//! Multi-page listing with batching, pacing and early termination.

use futures::future::join_all;

use crate::error::Result;
use crate::models::{ListPage, PaginationOptions, PostSummary, ResumeEmptyPolicy, Retrieved};
use crate::services::ListSource;
use crate::utils::{Pacer, Pause};

/// Whether pagination should go on after a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next,
    Done,
}

/// Accumulates page results and decides when to stop.
struct Collector<'a> {
    options: &'a PaginationOptions,
    posts: Vec<PostSummary>,
    resuming: bool,
}

impl<'a> Collector<'a> {
    fn new(options: &'a PaginationOptions) -> Self {
        let resuming = options.continue_from_last
            && options
                .last_article_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty());
        Self {
            options,
            posts: Vec::new(),
            resuming,
        }
    }

    fn remaining(&self) -> usize {
        self.options.total_required.saturating_sub(self.posts.len())
    }

    /// Items to request for the next page.
    fn required(&self) -> usize {
        (self.options.page_size as usize).min(self.remaining())
    }

    fn absorb(&mut self, page: u32, result: Retrieved<ListPage>) -> Step {
        let ListPage { posts, fetched } = result.data;
        let count = posts.len();
        log::info!(
            "Page {}: {} posts ({:?}), {} collected so far",
            page,
            count,
            result.source,
            self.posts.len() + count
        );
        self.posts.extend(posts);

        if self.posts.len() >= self.options.total_required {
            self.posts.truncate(self.options.total_required);
            log::info!("Collected the requested {} posts", self.options.total_required);
            return Step::Done;
        }

        // the board itself ran out, whatever the filter kept
        if fetched < self.options.page_size as usize {
            log::info!("Page {}: last page of the board", page);
            return Step::Done;
        }

        if count == 0 && self.resuming {
            return match self.options.resume_empty {
                ResumeEmptyPolicy::Continue => {
                    log::info!("Page {}: no new posts, scanning the next page", page);
                    Step::Next
                }
                ResumeEmptyPolicy::Stop => {
                    log::info!("Page {}: no new posts, stopping", page);
                    Step::Done
                }
            };
        }

        if count < self.options.page_size as usize {
            log::info!("Page {}: short page, no further pages", page);
            return Step::Done;
        }

        Step::Next
    }
}

/// Fetch pages `start_page..=end_page` until the target count is reached,
/// a short page is seen, or the range is exhausted.
///
/// Only session faults are returned as `Err`; failed pages count as empty.
pub async fn paginate(
    source: &dyn ListSource,
    pacer: &dyn Pacer,
    options: &PaginationOptions,
) -> Result<Vec<PostSummary>> {
    if options.start_page > options.end_page || options.total_required == 0 {
        return Ok(Vec::new());
    }

    let pages: Vec<u32> = (options.start_page..=options.end_page).collect();
    let batch_size = options.batch_size.max(1);
    let batch_count = pages.len().div_ceil(batch_size);
    let mut collector = Collector::new(options);

    log::info!(
        "Scanning pages {}-{} in {} batches ({}), target {} posts",
        options.start_page,
        options.end_page,
        batch_count,
        if options.parallel { "parallel" } else { "sequential" },
        options.total_required
    );

    for (batch_index, batch) in pages.chunks(batch_size).enumerate() {
        let step = if options.parallel {
            run_parallel(source, batch, &mut collector).await?
        } else {
            run_sequential(source, pacer, batch, &mut collector).await?
        };

        if step == Step::Done {
            break;
        }
        if batch_index + 1 < batch_count {
            log::debug!("Batch {} done, pausing before the next", batch_index + 1);
            pacer.pause(Pause::BetweenPageBatches).await;
        }
    }

    log::info!("Collected {} post summaries", collector.posts.len());
    Ok(collector.posts)
}

async fn run_sequential(
    source: &dyn ListSource,
    pacer: &dyn Pacer,
    batch: &[u32],
    collector: &mut Collector<'_>,
) -> Result<Step> {
    for (i, &page) in batch.iter().enumerate() {
        let list_options = collector.options.page(page, collector.required());
        let result = source.fetch_page(&list_options).await?;
        if collector.absorb(page, result) == Step::Done {
            return Ok(Step::Done);
        }
        if i + 1 < batch.len() {
            pacer.pause(Pause::BetweenPages).await;
        }
    }
    Ok(Step::Next)
}

async fn run_parallel(
    source: &dyn ListSource,
    batch: &[u32],
    collector: &mut Collector<'_>,
) -> Result<Step> {
    let required = collector.required();
    let requests: Vec<_> = batch
        .iter()
        .map(|&page| collector.options.page(page, required))
        .collect();
    let results = join_all(requests.iter().map(|o| source.fetch_page(o))).await;

    for (&page, result) in batch.iter().zip(results) {
        if collector.absorb(page, result?) == Step::Done {
            let skipped = batch.iter().filter(|p| **p > page).count();
            if skipped > 0 {
                log::debug!("Discarding {} later pages of this batch", skipped);
            }
            return Ok(Step::Done);
        }
    }
    Ok(Step::Next)
}
