// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod checkpoint;
mod config;
mod options;
mod post;

// Re-export all public types
pub use checkpoint::CrawlCheckpoint;
pub use config::{
    CafeConfig, Config, CrawlerConfig, DelayConfig, MAX_API_PAGE_SIZE, PathsConfig,
    SelectorConfig,
};
pub use options::{
    BatchOptions, DetailOptions, ListOptions, ListPage, PaginationOptions, ResumeEmptyPolicy,
    Retrieved, RetrievalMode, Source,
};
pub use post::{
    AttachmentRef, Comment, ImageRef, PostDetail, PostSummary, WriterInfo, sort_comments,
};
