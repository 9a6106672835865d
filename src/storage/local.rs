//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── articles_{start}_{end}.json
//! └── articles_summary.json
//! ```
//!
//! Every file is written to a temporary sibling first and renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{ArticleStorage, ChunkDocument, SummaryDocument};

const SUMMARY_KEY: &str = "articles_summary.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Key of the chunk document covering positions `start..=end`.
    pub fn chunk_key(start: usize, end: usize) -> String {
        format!("articles_{start}_{end}.json")
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<String> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.write_bytes(key, &bytes).await?;
        Ok(path.display().to_string())
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ArticleStorage for LocalStorage {
    async fn write_chunk(&self, start: usize, end: usize, doc: &ChunkDocument) -> Result<String> {
        let location = self.write_json(&Self::chunk_key(start, end), doc).await?;
        log::info!("Saved {} posts to {}", doc.articles.len(), location);
        Ok(location)
    }

    async fn write_summary(&self, doc: &SummaryDocument) -> Result<String> {
        let location = self.write_json(SUMMARY_KEY, doc).await?;
        log::info!("Saved summary of {} posts to {}", doc.total_count, location);
        Ok(location)
    }

    async fn load_summary(&self) -> Result<Option<SummaryDocument>> {
        self.read_json(SUMMARY_KEY).await
    }
}
