// src/utils/pacing.rs

//! Cooperative rate limiting.
//!
//! Every wait the crawler performs goes through a [`Pacer`], so the
//! orchestration code can be driven without real delays in tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::models::DelayConfig;

/// The kind of wait being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pause {
    /// After each remote API attempt.
    Request,
    /// Between two pages of a sequential pagination run.
    BetweenPages,
    /// Between two batches of pages.
    BetweenPageBatches,
    /// Between two posts of a safe-mode detail chunk.
    BetweenItems,
    /// Between two detail chunks.
    BetweenChunks,
    /// After an item re-processed on the per-item fallback path.
    RetryItem,
    /// Between two output groups.
    BetweenGroups,
    /// Before retrying an API call that failed with a 5xx status.
    RetryBackoff,
}

/// Something that can wait.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, pause: Pause);
}

/// Sleeps a random duration drawn from the configured window of each pause.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    delay: DelayConfig,
}

impl RandomPacer {
    pub fn new(delay: DelayConfig) -> Self {
        Self { delay }
    }

    /// Inclusive `(min, max)` window in milliseconds for a pause.
    pub fn window(&self, pause: Pause) -> (u64, u64) {
        let d = &self.delay;
        let (min, max) = match pause {
            Pause::Request | Pause::BetweenPages => (d.min_ms, d.max_ms),
            Pause::BetweenPageBatches => (d.max_ms, d.max_ms * 2),
            Pause::BetweenGroups => (d.min_ms * 2, d.max_ms * 2),
            Pause::BetweenItems => (d.item_min_ms, d.item_max_ms),
            Pause::BetweenChunks => (d.batch_min_ms, d.batch_max_ms),
            Pause::RetryItem => (d.retry_item_min_ms, d.retry_item_max_ms),
            Pause::RetryBackoff => (d.retry_backoff_ms, d.retry_backoff_ms),
        };
        if max < min { (max, min) } else { (min, max) }
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn pause(&self, pause: Pause) {
        let (min, max) = self.window(pause);
        let millis = if min == max {
            min
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        if millis == 0 {
            return;
        }
        log::debug!("Waiting {}ms ({:?})", millis, pause);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self, _pause: Pause) {}
}

/// Never waits, but remembers every pause requested.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Pause>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pauses requested so far, in order.
    pub fn pauses(&self) -> Vec<Pause> {
        self.pauses
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// How many times `pause` was requested.
    pub fn count(&self, pause: Pause) -> usize {
        self.pauses().iter().filter(|p| **p == pause).count()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, pause: Pause) {
        if let Ok(mut guard) = self.pauses.lock() {
            guard.push(pause);
        }
    }
}
