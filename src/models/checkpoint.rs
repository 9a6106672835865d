// src/models/checkpoint.rs

//! Resume state carried between runs.

use serde::{Deserialize, Serialize};

/// Highest post ID seen by the last successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlCheckpoint {
    pub last_article_id: String,
    pub continue_from_last: bool,
}

impl CrawlCheckpoint {
    /// The ID to resume after, when resuming is enabled.
    pub fn resume_from(&self) -> Option<&str> {
        let id = self.last_article_id.trim();
        (self.continue_from_last && !id.is_empty()).then_some(id)
    }
}
