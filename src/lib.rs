// src/lib.rs

//! Cafe Crawler Library
//!
//! Collects board listings and full posts from a Naver cafe, preferring the
//! cafe's JSON API and falling back to page markup, and resumes from the
//! highest article ID seen by the previous run.

pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod storage;
pub mod utils;
