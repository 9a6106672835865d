// src/session/http.rs

//! `reqwest`-backed session using an exported cookie jar.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Config;
use crate::session::{Cookie, HttpResponse, Session};
use crate::utils::http::create_async_client;

/// Session backed by a plain HTTP client and a host-scoped cookie jar.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl HttpSession {
    /// Build a session from cookies. Fails when no cookie is usable.
    ///
    /// Cookies are stored for the cafe's site, board and API hosts only, so
    /// frames served from other hosts are loaded without them.
    pub fn new(config: &Config, cookies: Vec<Cookie>) -> Result<Self> {
        if cookies.is_empty() {
            return Err(AppError::session("no usable cookies; log in and export them first"));
        }

        let jar = Arc::new(Jar::default());
        for origin in cookie_origins(config)? {
            for cookie in &cookies {
                jar.add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), &origin);
            }
        }

        Ok(Self {
            client: create_async_client(&config.crawler, Arc::clone(&jar))?,
            jar,
            timeout: Duration::from_secs(config.crawler.timeout_secs),
        })
    }

    /// Build a session from a cookie file on disk.
    pub async fn from_cookie_file(config: &Config, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::session(format!("cannot read cookie file {}: {}", path.display(), e))
        })?;
        let cookies = parse_cookie_file(&content);
        log::info!("Loaded {} cookies from {}", cookies.len(), path.display());
        Self::new(config, cookies)
    }

    fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| AppError::validation(format!("bad header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| AppError::validation(format!("bad header value for {name}: {e}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// Hosts the logged-in cookies belong to.
fn cookie_origins(config: &Config) -> Result<Vec<Url>> {
    [
        &config.cafe.site_base,
        &config.cafe.cafe_url,
        &config.cafe.api_base,
    ]
    .into_iter()
    .map(|base| {
        Url::parse(base)
            .map_err(|e| AppError::validation(format!("invalid cafe address {base:?}: {e}")))
    })
    .collect()
}

#[async_trait]
impl Session for HttpSession {
    fn cookies(&self, url: &str) -> Result<Vec<Cookie>> {
        let Ok(url) = Url::parse(url) else {
            return Ok(Vec::new());
        };
        let Some(header) = self.jar.cookies(&url) else {
            return Ok(Vec::new());
        };
        let header = header
            .to_str()
            .map_err(|e| AppError::session(format!("cookie jar holds a bad value: {e}")))?;
        Ok(parse_cookie_file(header))
    }

    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .headers(Self::header_map(headers)?)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn navigate(&self, url: &str) -> Result<String> {
        let response = self.get(url, &[]).await?;
        if !response.is_success() {
            return Err(AppError::api(url, response.status));
        }
        Ok(response.body)
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Parse an exported cookie jar.
///
/// Accepts Netscape `cookies.txt` lines (tab separated, seven fields), a
/// `Cookie:` header line, or `name=value` pairs separated by `;` or newlines.
/// Comments and malformed entries are skipped.
pub fn parse_cookie_file(content: &str) -> Vec<Cookie> {
    let mut cookies = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        // "#HttpOnly_" prefixes real entries in Netscape jars
        let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() == 7 {
            if !fields[5].is_empty() {
                cookies.push(Cookie::new(fields[5], fields[6]));
            }
            continue;
        }

        let pairs = line
            .strip_prefix("Cookie:")
            .or_else(|| line.strip_prefix("cookie:"))
            .unwrap_or(line);
        for pair in pairs.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies.push(Cookie::new(name, value.trim()));
                }
            }
        }
    }
    cookies
}
