//! HTTP fetcher implementation
//!
//! This module handles every outbound request the crawler makes:
//! - Building the HTTP client with the configured user agent and timeout
//! - Issuing a single GET per page (no retries at this layer)
//! - Streaming the body while enforcing the size cap
//! - Classifying failures into [`FetchError`]

use crate::config::CrawlerConfig;
use crate::url::CanonicalUrl;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or body-read failure
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Non-2xx response
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Body exceeded the configured cap
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl FetchError {
    /// Returns true when the server was never reached
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if let Some(status) = error.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// The URL that was requested
    pub url: CanonicalUrl,
    /// HTTP status code of the final response
    pub status: u16,
    /// Body decoded as UTF-8, invalid sequences replaced
    pub body: String,
    /// Raw body length in bytes
    pub bytes: usize,
}

/// Retrieves pages over HTTP
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher from the crawler configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use link_sweep::config::CrawlerConfig;
    /// use link_sweep::crawler::HttpFetcher;
    ///
    /// let fetcher = HttpFetcher::new(&CrawlerConfig::default()).unwrap();
    /// ```
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            config.request_timeout(),
        )?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Fetches `url` with a single GET
    ///
    /// # Error Classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Non-2xx status | `Http { status }` |
    /// | Timeout (connect, headers or body) | `Timeout` |
    /// | Connection refused, DNS, TLS | `Network` |
    /// | Content-Length or streamed body over cap | `TooLarge` |
    pub async fn fetch(&self, url: &CanonicalUrl) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let body = read_body_capped(response, self.max_body_bytes).await?;
        let bytes = body.len();

        Ok(Page {
            url: url.clone(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
            bytes,
        })
    }
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Reads the response body chunk by chunk, bailing out past `limit` bytes
async fn read_body_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    if let Some(declared) = response.content_length() {
        if declared > limit as u64 {
            return Err(FetchError::TooLarge { limit });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(FetchError::from_reqwest)? {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
