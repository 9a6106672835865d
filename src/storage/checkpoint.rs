// src/storage/checkpoint.rs

//! Resume checkpoint kept as `KEY=value` lines.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{CrawlCheckpoint, PostSummary};

const LAST_ARTICLE_ID: &str = "LAST_ARTICLE_ID";
const CONTINUE_FROM_LAST: &str = "CONTINUE_FROM_LAST";

/// The ID with the largest numeric value, ignoring non-numeric IDs.
pub fn find_latest_id(posts: &[PostSummary]) -> Option<String> {
    posts
        .iter()
        .filter_map(|post| post.numeric_id().map(|n| (n, post)))
        .max_by_key(|(n, _)| *n)
        .map(|(_, post)| post.id.trim().to_string())
}

/// Reads and updates the checkpoint file.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current checkpoint; a missing file is the default checkpoint.
    pub async fn load(&self) -> Result<CrawlCheckpoint> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No checkpoint at {}", self.path.display());
                return Ok(CrawlCheckpoint::default());
            }
            Err(e) => return Err(AppError::Io(e)),
        };
        Ok(parse_checkpoint(&content))
    }

    /// Record `article_id` as the resume point and enable resuming.
    /// Unrelated lines are kept.
    pub async fn persist(&self, article_id: &str) -> Result<()> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(AppError::Io(e)),
        };
        let content = upsert(&content, LAST_ARTICLE_ID, article_id);
        let content = upsert(&content, CONTINUE_FROM_LAST, "true");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, content).await?;
        log::info!(
            "Checkpoint updated: {}={} ({})",
            LAST_ARTICLE_ID,
            article_id,
            self.path.display()
        );
        Ok(())
    }
}

fn parse_checkpoint(content: &str) -> CrawlCheckpoint {
    let mut checkpoint = CrawlCheckpoint::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        match key.trim() {
            LAST_ARTICLE_ID => checkpoint.last_article_id = value.to_string(),
            CONTINUE_FROM_LAST => checkpoint.continue_from_last = value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }
    checkpoint
}

/// Replace the line starting with `KEY=`, or append one.
fn upsert(content: &str, key: &str, value: &str) -> String {
    let prefix = format!("{key}=");
    let entry = format!("{key}={value}");
    let mut found = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if !found && line.trim_start().starts_with(&prefix) {
                found = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();
    if !found {
        lines.push(entry);
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
