// src/pipeline/batch.rs

//! Chunked detail retrieval with per-item failure isolation.

use futures::stream::{self, StreamExt};

use crate::models::{BatchOptions, PostDetail, PostSummary};
use crate::services::DetailSource;
use crate::utils::{Pacer, Pause};

/// Fetch the full record of every post, in input order.
///
/// Posts are processed in chunks of `options.batch_size`. A chunk whose
/// execution fails is finished one post at a time; a post that still fails
/// is recorded as a stub with `error` set, so the output always has one
/// entry per input post.
///
/// `on_item` is called once per post with its 1-based position, the total
/// count and the result. It only observes.
pub async fn fetch_details_in_batches<F>(
    source: &dyn DetailSource,
    pacer: &dyn Pacer,
    posts: &[PostSummary],
    options: &BatchOptions,
    mut on_item: F,
) -> Vec<PostDetail>
where
    F: FnMut(usize, usize, &PostDetail),
{
    let total = posts.len();
    let batch_size = options.batch_size.max(1);
    let chunk_count = total.div_ceil(batch_size);
    let mut details = Vec::with_capacity(total);

    log::info!(
        "Fetching {} posts in {} chunks of up to {} ({})",
        total,
        chunk_count,
        batch_size,
        if options.safe_mode { "sequential" } else { "concurrent" }
    );

    for (chunk_index, chunk) in posts.chunks(batch_size).enumerate() {
        let offset = chunk_index * batch_size;
        log::info!(
            "Chunk {}/{}: posts {}-{}",
            chunk_index + 1,
            chunk_count,
            offset + 1,
            offset + chunk.len()
        );

        let mut run = if options.safe_mode {
            run_sequential(source, pacer, chunk, options, offset, total, &mut on_item).await
        } else {
            run_concurrent(source, chunk, options, offset, total, &mut on_item).await
        };

        if let Some(error) = &run.error {
            let missing = run.slots.iter().filter(|s| s.is_none()).count();
            log::warn!(
                "Chunk {}/{} failed ({}); retrying {} posts one at a time",
                chunk_index + 1,
                chunk_count,
                error,
                missing
            );
            for (summary, slot) in chunk.iter().zip(run.slots.iter_mut()) {
                if slot.is_none() {
                    pacer.pause(Pause::RetryItem).await;
                    *slot = Some(retry_item(source, summary, options).await);
                }
            }
        }

        for (i, (slot, reported)) in run.slots.into_iter().zip(run.reported).enumerate() {
            let detail =
                slot.unwrap_or_else(|| PostDetail::failed(chunk[i].clone(), "not retrieved"));
            if !reported {
                on_item(offset + i + 1, total, &detail);
            }
            details.push(detail);
        }

        if chunk_index + 1 < chunk_count {
            pacer.pause(Pause::BetweenChunks).await;
        }
    }

    let failed = details.iter().filter(|d| d.is_failed()).count();
    log::info!(
        "Fetched {} posts ({} ok, {} failed)",
        details.len(),
        details.len() - failed,
        failed
    );
    details
}

/// Outcome of running one chunk on its normal path.
struct ChunkRun {
    /// Index-aligned with the chunk; `None` for posts that need a retry
    slots: Vec<Option<PostDetail>>,
    /// Slots already passed to the progress callback
    reported: Vec<bool>,
    error: Option<String>,
}

async fn run_sequential<F>(
    source: &dyn DetailSource,
    pacer: &dyn Pacer,
    chunk: &[PostSummary],
    options: &BatchOptions,
    offset: usize,
    total: usize,
    on_item: &mut F,
) -> ChunkRun
where
    F: FnMut(usize, usize, &PostDetail),
{
    let mut slots: Vec<Option<PostDetail>> = Vec::with_capacity(chunk.len());
    let mut error = None;
    for (i, summary) in chunk.iter().enumerate() {
        match source.fetch_detail(summary, &options.detail).await {
            Ok(result) => {
                on_item(offset + i + 1, total, &result.data);
                slots.push(Some(result.data));
            }
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
        if i + 1 < chunk.len() {
            pacer.pause(Pause::BetweenItems).await;
        }
    }
    let mut reported = vec![true; slots.len()];
    slots.resize_with(chunk.len(), || None);
    reported.resize(chunk.len(), false);
    ChunkRun {
        slots,
        reported,
        error,
    }
}

/// Issue every post of the chunk at once. Progress is reported in
/// completion order; slots stay aligned with the chunk.
async fn run_concurrent<F>(
    source: &dyn DetailSource,
    chunk: &[PostSummary],
    options: &BatchOptions,
    offset: usize,
    total: usize,
    on_item: &mut F,
) -> ChunkRun
where
    F: FnMut(usize, usize, &PostDetail),
{
    let mut pending = stream::iter(chunk.iter().enumerate())
        .map(|(i, summary)| async move {
            let result = source.fetch_detail(summary, &options.detail).await;
            (i, result)
        })
        .buffer_unordered(chunk.len().max(1));

    let mut slots: Vec<Option<PostDetail>> = vec![None; chunk.len()];
    let mut reported = vec![false; chunk.len()];
    let mut error = None;
    while let Some((i, result)) = pending.next().await {
        match result {
            Ok(result) => {
                on_item(offset + i + 1, total, &result.data);
                slots[i] = Some(result.data);
                reported[i] = true;
            }
            Err(e) => {
                error.get_or_insert_with(|| e.to_string());
            }
        }
    }
    ChunkRun {
        slots,
        reported,
        error,
    }
}

async fn retry_item(
    source: &dyn DetailSource,
    summary: &PostSummary,
    options: &BatchOptions,
) -> PostDetail {
    match source.fetch_detail(summary, &options.detail).await {
        Ok(result) => result.data,
        Err(e) => {
            log::error!("Article {}: retry failed: {}", summary.id, e);
            PostDetail::failed(summary.clone(), e.to_string())
        }
    }
}
