//! Storage abstractions for crawl output.
//!
//! A run produces one chunk document per output group and a summary
//! document at the end:
//!
//! ```text
//! output/
//! ├── articles_1_10.json     # {articles: [PostDetail, ...]}
//! ├── articles_11_20.json
//! └── articles_summary.json  # counts, checkpoint ID, short listing
//! ```

pub mod checkpoint;
pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{PostDetail, PostSummary};

// Re-export for convenience
pub use checkpoint::{CheckpointStore, find_latest_id};
pub use local::LocalStorage;

/// One output group of full posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub articles: Vec<PostDetail>,
}

/// Short listing entry of the summary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub id: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub url: String,
    pub views: u64,
    pub comment_count: u64,
}

impl From<&PostSummary> for SummaryEntry {
    fn from(post: &PostSummary) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author: post.author.clone(),
            date: post.date.clone(),
            url: post.url.clone(),
            views: post.view_count,
            comment_count: post.comment_count,
        }
    }
}

/// End-of-run overview of everything listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDocument {
    pub total_count: usize,
    pub collected_at: DateTime<Utc>,
    pub cafe_id: String,
    pub last_article_id: Option<String>,
    pub articles: Vec<SummaryEntry>,
}

impl SummaryDocument {
    pub fn new(cafe_id: &str, last_article_id: Option<String>, posts: &[PostSummary]) -> Self {
        Self {
            total_count: posts.len(),
            collected_at: Utc::now(),
            cafe_id: cafe_id.to_string(),
            last_article_id,
            articles: posts.iter().map(SummaryEntry::from).collect(),
        }
    }
}

/// Trait for crawl output backends.
#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Write the posts of one group. `start` and `end` are the 1-based
    /// positions of the group in the run. Returns where it was written.
    async fn write_chunk(&self, start: usize, end: usize, doc: &ChunkDocument) -> Result<String>;

    /// Write the end-of-run summary. Returns where it was written.
    async fn write_summary(&self, doc: &SummaryDocument) -> Result<String>;

    /// Load a previously written summary, if any.
    async fn load_summary(&self) -> Result<Option<SummaryDocument>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_document_shape() {
        let post = PostSummary {
            id: "7".to_string(),
            title: "t".to_string(),
            author: "a".to_string(),
            date: "2024-01-01 10:00".to_string(),
            view_count: 3,
            comment_count: 2,
            url: "https://cafe.naver.com/x/7".to_string(),
            menu_name: None,
            summary: None,
        };
        let doc = SummaryDocument::new("123", Some("7".to_string()), &[post]);
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["totalCount"], 1);
        assert_eq!(value["cafeId"], "123");
        assert_eq!(value["lastArticleId"], "7");
        assert!(value["collectedAt"].is_string());
        assert_eq!(value["articles"][0]["views"], 3);
        assert_eq!(value["articles"][0]["commentCount"], 2);
    }
}
