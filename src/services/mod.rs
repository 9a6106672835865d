//! Service layer for the crawler application.
//!
//! This module contains the retrieval logic for:
//! - The cafe's JSON API (`CafeApi`)
//! - Board pages, API first with markup fallback (`ArticleListService`)
//! - Single posts, API first with markup fallback (`ArticleDetailService`)

pub mod api;
mod detail;
mod html_detail;
mod html_list;
mod list;

pub use api::{CafeApi, MAX_API_ATTEMPTS};
pub use detail::{ArticleDetailService, DetailSource};
pub use html_detail::{HtmlDetail, HtmlDetailParser};
pub use html_list::{FrameSources, HtmlListParser, board_page_url};
pub use list::{ArticleListService, ListSource, filter_newer};
