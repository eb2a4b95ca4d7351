use crate::url::ScopeMatch;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Link-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// URL the crawl starts from; its domain defines "internal"
    #[serde(default)]
    pub seed: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the seed
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Self::default()
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Largest response body accepted (bytes)
    #[serde(rename = "max-body-bytes")]
    pub max_body_bytes: usize,

    /// Stop dispatching fetches after this many pages
    #[serde(rename = "max-pages")]
    pub max_pages: Option<usize>,

    /// Cancel the crawl after this many seconds
    #[serde(rename = "max-duration-secs")]
    pub max_duration_secs: Option<u64>,

    /// How internal links are recognized
    #[serde(rename = "scope-match")]
    pub scope_match: ScopeMatch,

    /// Maximum concurrent in-flight fetches per host
    #[serde(rename = "per-host-limit")]
    pub per_host_limit: Option<usize>,

    /// Time in-flight fetches get to finish after cancellation (milliseconds)
    #[serde(rename = "grace-period-ms")]
    pub grace_period_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            request_timeout_ms: 10_000,
            max_body_bytes: 5 * 1024 * 1024,
            max_pages: None,
            max_duration_secs: None,
            scope_match: ScopeMatch::Substring,
            per_host_limit: None,
            grace_period_ms: 5_000,
            user_agent: format!("link-sweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the link files are written into
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
        }
    }
}
