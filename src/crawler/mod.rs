//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts and a body size cap
//! - HTML parsing and href extraction
//! - The visited registry and the work frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod registry;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, Page};
pub use frontier::{Frontier, FrontierLimits, Lease};
pub use parser::{extract_hrefs, Hrefs};
pub use registry::{LinkRecord, Recorded, VisitedRegistry, VisitedSnapshot};

use crate::config::Config;
use crate::output::EventSink;
use crate::LinkSweepError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation, streaming events to `sink`
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and canonicalize the seed
/// 2. Fetch the seed and record its links
/// 3. Run the worker pool until the frontier drains or `cancel` fires
/// 4. Return the sorted internal and external URL sets
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished, possibly cancelled
/// * `Err(LinkSweepError)` - Bad configuration or unreachable seed
pub async fn crawl(
    config: Config,
    sink: impl EventSink + 'static,
    cancel: CancellationToken,
) -> Result<CrawlReport, LinkSweepError> {
    let mut coordinator = Coordinator::new(config)?.with_events(sink);
    coordinator.run(cancel).await
}
