//! Utility functions and helpers.

pub mod http;
pub mod pacing;
pub mod text;
pub mod url;

pub use pacing::{NoopPacer, Pacer, Pause, RandomPacer, RecordingPacer};
pub use text::{clean_text, decode_entities, strip_tags};
pub use url::{extract_article_id, resolve_url};
