// src/session/mod.rs

//! Authenticated access to the cafe.
//!
//! Every network call the crawler makes goes through a [`Session`]. The
//! session owns the cookie jar of a logged-in user and the request timeout.
//! Cookies are only ever sent to the cafe's own hosts.

mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use http::{HttpSession, parse_cookie_file};

/// A single cookie of the logged-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Authenticated browsing capability shared by every service.
#[async_trait]
pub trait Session: Send + Sync {
    /// Cookies the jar holds for `url`. Fails when the session is unusable.
    fn cookies(&self, url: &str) -> Result<Vec<Cookie>>;

    /// Issue a GET with extra headers. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;

    /// Load a page and return its markup.
    async fn navigate(&self, url: &str) -> Result<String>;

    /// Timeout applied to every request.
    fn timeout(&self) -> Duration;

    /// Cookies for `url` formatted for a `Cookie` header; empty when none apply.
    fn cookie_header(&self, url: &str) -> Result<String> {
        Ok(self
            .cookies(url)?
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCookies;

    #[async_trait]
    impl Session for FixedCookies {
        fn cookies(&self, _url: &str) -> Result<Vec<Cookie>> {
            Ok(vec![Cookie::new("NID_AUT", "abc"), Cookie::new("NID_SES", "xyz")])
        }

        async fn get(&self, _url: &str, _headers: &[(String, String)]) -> Result<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                body: String::new(),
            })
        }

        async fn navigate(&self, _url: &str) -> Result<String> {
            Ok(String::new())
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    #[test]
    fn test_cookie_header_joins_pairs() {
        assert_eq!(
            FixedCookies.cookie_header("https://cafe.naver.com").unwrap(),
            "NID_AUT=abc; NID_SES=xyz"
        );
    }

    #[test]
    fn test_response_success_range() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        let err = HttpResponse {
            status: 503,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!err.is_success());
    }
}
