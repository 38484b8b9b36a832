//! HTTP fetcher for reference pages served by a web origin

use super::{DocumentFetcher, DocumentHead, FetchedDocument};
use crate::error::{MedfinderError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, LAST_MODIFIED};
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;

/// Fetches documents relative to a base URL
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Create a fetcher rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("medfinder/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, base_url)
    }

    /// Create a fetcher with a custom client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)
            .map_err(|e| MedfinderError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        Ok(Self { client, base })
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| MedfinderError::InvalidInput(format!("Invalid path {}: {}", path, e)))
    }

    fn check_status(response: &Response, url: &Url) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                MedfinderError::DocumentNotFound(url.to_string())
            }
            s if s.is_server_error() => MedfinderError::Fetch(format!(
                "Server error ({}): {}",
                s.as_u16(),
                url
            )),
            s => MedfinderError::Fetch(format!(
                "HTTP error {} {}: {}",
                s.as_u16(),
                s.canonical_reason().unwrap_or("Unknown error"),
                url
            )),
        })
    }

    fn map_send_error(e: reqwest::Error, url: &Url) -> MedfinderError {
        if e.is_timeout() {
            MedfinderError::Timeout {
                path: url.to_string(),
                secs: 30,
            }
        } else if e.is_connect() {
            MedfinderError::Fetch(format!("Connection error fetching {}: {}", url, e))
        } else {
            MedfinderError::Fetch(format!("Failed to fetch URL {}: {}", url, e))
        }
    }
}

/// Parse `Last-Modified` (RFC 7231 IMF-fixdate, which RFC 2822 parsing accepts)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn read_head(headers: &HeaderMap) -> DocumentHead {
    DocumentHead {
        last_modified: headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date),
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok()),
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    fn fetcher_type(&self) -> &'static str {
        "http"
    }

    async fn head(&self, path: &str) -> Result<DocumentHead> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, &url))?;
        Self::check_status(&response, &url)?;
        Ok(read_head(response.headers()))
    }

    async fn get(&self, path: &str) -> Result<FetchedDocument> {
        let url = self.url_for(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, &url))?;
        Self::check_status(&response, &url)?;

        let head = read_head(response.headers());
        let body = response.text().await.map_err(|e| {
            MedfinderError::Fetch(format!("Failed to read response body from {}: {}", url, e))
        })?;

        Ok(FetchedDocument {
            path: path.to_string(),
            body,
            last_modified: head.last_modified,
            content_length: head.content_length,
        })
    }
}
