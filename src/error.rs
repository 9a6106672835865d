// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The authenticated session is unusable
    #[error("Session error: {0}")]
    Session(String),

    /// Remote API answered with a non-success status
    #[error("API request to {url} failed with status {status}")]
    Api { url: String, status: u16 },

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create an API status error.
    pub fn api(url: impl Into<String>, status: u16) -> Self {
        Self::Api {
            url: url.into(),
            status,
        }
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a server-side (5xx) API failure worth retrying.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (500..600).contains(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_classification() {
        assert!(AppError::api("https://example.com", 503).is_server_error());
        assert!(!AppError::api("https://example.com", 404).is_server_error());
        assert!(!AppError::session("no cookies").is_server_error());
    }

    #[test]
    fn test_crawl_error_message() {
        let err = AppError::crawl("article 42", "timed out");
        assert_eq!(err.to_string(), "Crawl error for article 42: timed out");
    }
}
