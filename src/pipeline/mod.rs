//! Pipeline entry points for crawler operations.
//!
//! - `paginate`: Collect post summaries across a page range
//! - `fetch_details_in_batches`: Fetch full posts chunk by chunk
//! - `run_crawler`: Paginate, fetch, write and checkpoint in one run

mod batch;
pub mod crawl;
mod paginate;

pub use batch::fetch_details_in_batches;
pub use crawl::{Crawl, CrawlOptions, CrawlReport, run_crawler};
pub use paginate::paginate;
