//! Markup parsing.
//!
//! - `html`: generic pattern, element, link, image and table extraction
//! - `cascade`: ordered selector fallbacks over a parsed document

pub mod cascade;
pub mod html;

pub use cascade::{Cascade, EachStrategy, FirstStrategy, Hit, Strategy, TextStrategy, parse_selector};
pub use html::{
    Image, Link, TableData, TableOptions, extract_all_patterns, extract_element,
    extract_images, extract_links, extract_meta_content, extract_pattern, extract_table_data,
};
