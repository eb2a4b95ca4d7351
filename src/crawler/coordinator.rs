//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl state machine and the worker pool that
//! coordinates all aspects of the crawling process, including:
//! - Seeding the registry and frontier from the seed URL
//! - Running a fixed pool of workers against the shared frontier
//! - Fetching pages, extracting and classifying their links
//! - Detecting drain, handling cancellation and the optional deadline
//! - Producing the final [`CrawlReport`]

use crate::config::{validate, Config};
use crate::crawler::fetcher::{FetchError, HttpFetcher};
use crate::crawler::frontier::{Frontier, FrontierLimits};
use crate::crawler::parser::extract_hrefs;
use crate::crawler::registry::{LinkRecord, Recorded, VisitedRegistry};
use crate::output::{CrawlEvent, EventSink, NullSink};
use crate::state::{CounterSnapshot, CrawlCounters, CrawlPhase};
use crate::url::{canonicalize, canonicalize_seed, CanonicalUrl, ScopeRule};
use crate::LinkSweepError;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Number of pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Final result of a crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The canonical seed URL
    pub seed: CanonicalUrl,

    /// Authority the scope rule compared against
    pub seed_authority: String,

    /// Every internal URL discovered, sorted
    pub internal: BTreeSet<CanonicalUrl>,

    /// Every external URL discovered, sorted
    pub external: BTreeSet<CanonicalUrl>,

    /// Page, byte and link counters
    pub counters: CounterSnapshot,

    /// Internal URLs discovered but never fetched (page cap or cancellation)
    pub unfetched: usize,

    /// Wall-clock time from seeding to snapshot
    pub elapsed: Duration,

    /// True when the crawl was stopped before the frontier drained
    pub cancelled: bool,
}

impl CrawlReport {
    /// Total distinct URLs discovered, internal plus external
    pub fn total_urls(&self) -> usize {
        self.internal.len() + self.external.len()
    }
}

/// Everything a worker needs, shared across the pool
struct CrawlContext {
    fetcher: HttpFetcher,
    registry: Arc<VisitedRegistry>,
    frontier: Arc<Frontier>,
    scope: ScopeRule,
    counters: CrawlCounters,
    events: Arc<dyn EventSink>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    seed: CanonicalUrl,
    context: Arc<CrawlContext>,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to [`run`](Self::run)
    /// * `Err(LinkSweepError)` - Invalid configuration or seed, or the HTTP
    ///   client could not be built
    pub fn new(config: Config) -> Result<Self, LinkSweepError> {
        validate(&config)?;

        let seed = canonicalize_seed(&config.seed).map_err(|source| {
            LinkSweepError::InvalidSeed {
                url: config.seed.clone(),
                source,
            }
        })?;

        let scope = ScopeRule::new(&seed, config.crawler.scope_match);
        let fetcher = HttpFetcher::new(&config.crawler)?;
        let frontier = Frontier::with_limits(FrontierLimits {
            per_host: config.crawler.per_host_limit,
            max_dispatch: config.crawler.max_pages,
        });

        let context = CrawlContext {
            fetcher,
            registry: Arc::new(VisitedRegistry::new()),
            frontier,
            scope,
            counters: CrawlCounters::new(),
            events: Arc::new(NullSink),
        };

        Ok(Self {
            config: Arc::new(config),
            seed,
            context: Arc::new(context),
            phase: CrawlPhase::Seeding,
        })
    }

    /// Routes crawl events to `sink` instead of discarding them
    ///
    /// Must be called before [`run`](Self::run).
    pub fn with_events(mut self, sink: impl EventSink + 'static) -> Self {
        if let Some(context) = Arc::get_mut(&mut self.context) {
            context.events = Arc::new(sink);
        }
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn seed(&self) -> &CanonicalUrl {
        &self.seed
    }

    pub fn scope(&self) -> &ScopeRule {
        &self.context.scope
    }

    /// The registry backing this crawl, for inspection after [`run`](Self::run)
    pub fn registry(&self) -> &VisitedRegistry {
        &self.context.registry
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// # Phases
    ///
    /// 1. **Seeding**: record the seed, push it, fetch it inline. A seed that
    ///    cannot be contacted at all aborts the crawl.
    /// 2. **Running**: `workers` tasks pull from the frontier until it drains.
    /// 3. **Draining**: the frontier is frozen; on cancellation, in-flight
    ///    pages get the grace period, then their tasks are aborted.
    /// 4. **Done**: the registry snapshot becomes the report.
    ///
    /// Cancelling `cancel` (or hitting `max-duration-secs`) still yields a
    /// report, flagged `cancelled`, holding everything discovered so far.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<CrawlReport, LinkSweepError> {
        if self.phase != CrawlPhase::Seeding {
            return Err(LinkSweepError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::Seeding,
            });
        }

        let start_time = Instant::now();
        let cancel = cancel.child_token();
        let deadline = self.config.crawler.max_duration().map(|limit| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!("Crawl deadline of {:?} reached, cancelling", limit);
                cancel.cancel();
            })
        });

        let result = self.run_phases(&cancel, start_time).await;

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        result
    }

    async fn run_phases(
        &mut self,
        cancel: &CancellationToken,
        start_time: Instant,
    ) -> Result<CrawlReport, LinkSweepError> {
        let context = Arc::clone(&self.context);

        // Seeding
        tracing::info!(
            "Seeding crawl from {} (scope: {} match on '{}')",
            self.seed,
            context.scope.mode(),
            context.scope.seed_authority()
        );
        let seed_scope = context.scope.classify(&self.seed);
        if context.registry.record(self.seed.clone(), seed_scope).is_new() {
            context
                .events
                .emit(CrawlEvent::discovered(seed_scope, self.seed.clone()));
        }
        context.frontier.push(self.seed.clone());

        if let Some(lease) = context.frontier.pop() {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = process_page(&context, lease.url()) => Some(result),
            };
            drop(lease);

            if let Some(Err(error)) = outcome {
                if error.is_unreachable() {
                    tracing::error!("Seed {} is unreachable: {}", self.seed, error);
                    context.frontier.freeze();
                    self.transition(CrawlPhase::Draining)?;
                    self.transition(CrawlPhase::Done)?;
                    return Err(LinkSweepError::SeedUnreachable {
                        url: self.seed.to_string(),
                        source: error,
                    });
                }
            }
        }

        let cancelled = if cancel.is_cancelled() {
            true
        } else {
            // Running
            self.transition(CrawlPhase::Running)?;
            let workers = self.config.crawler.workers;
            tracing::info!("Starting {} workers", workers);

            let mut pool = JoinSet::new();
            for id in 0..workers {
                pool.spawn(worker_loop(id, Arc::clone(&context), cancel.clone()));
            }

            let cancelled = tokio::select! {
                _ = context.frontier.wait_drained() => false,
                _ = cancel.cancelled() => true,
            };

            // Draining
            self.transition(CrawlPhase::Draining)?;
            context.frontier.freeze();

            if cancelled {
                let grace = self.config.crawler.grace_period();
                tracing::info!(
                    "Crawl cancelled, waiting up to {:?} for {} in-flight pages",
                    grace,
                    context.frontier.in_flight()
                );
                if tokio::time::timeout(grace, join_workers(&mut pool))
                    .await
                    .is_err()
                {
                    tracing::warn!("Grace period elapsed, aborting remaining workers");
                    pool.abort_all();
                    join_workers(&mut pool).await;
                }
            } else {
                join_workers(&mut pool).await;
            }

            cancelled
        };

        if self.phase == CrawlPhase::Seeding {
            self.transition(CrawlPhase::Draining)?;
            context.frontier.freeze();
        }

        // Done
        self.transition(CrawlPhase::Done)?;
        let snapshot = context.registry.snapshot();
        let unfetched = unfetched_count(&snapshot.internal, &context.counters);
        let report = CrawlReport {
            seed: self.seed.clone(),
            seed_authority: context.scope.seed_authority().to_string(),
            internal: snapshot.internal,
            external: snapshot.external,
            counters: context.counters.snapshot(),
            unfetched,
            elapsed: start_time.elapsed(),
            cancelled,
        };

        tracing::info!(
            "Crawl {}: {} internal, {} external, {} pages fetched, {} failed in {:?}",
            if cancelled { "cancelled" } else { "completed" },
            report.internal.len(),
            report.external.len(),
            report.counters.pages_fetched,
            report.counters.pages_failed,
            report.elapsed
        );

        Ok(report)
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), LinkSweepError> {
        if !self.phase.can_transition_to(next) {
            return Err(LinkSweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }
}

/// Pulls leases until the frontier drains, freezes or `cancel` fires
async fn worker_loop(id: usize, context: Arc<CrawlContext>, cancel: CancellationToken) {
    tracing::trace!("Worker {} started", id);

    while let Some(lease) = context.frontier.next(&cancel).await {
        // Failures are already counted and reported inside process_page
        let _ = process_page(&context, lease.url()).await;
        drop(lease);
    }

    tracing::trace!("Worker {} stopped", id);
}

/// Fetches one page and records every link on it
///
/// Returns the number of hrefs extracted. A fetch failure is counted,
/// reported, and returned; the page then contributes no links.
async fn process_page(context: &CrawlContext, url: &CanonicalUrl) -> Result<usize, FetchError> {
    let started = Instant::now();
    tracing::debug!("Crawling: {}", url);
    context.events.emit(CrawlEvent::page_started(url.clone()));

    let page = match context.fetcher.fetch(url).await {
        Ok(page) => page,
        Err(error) => {
            tracing::warn!("Failed to fetch {}: {}", url, error);
            log_progress(context, context.counters.record_failure());
            context
                .events
                .emit(CrawlEvent::page_failed(url.clone(), &error));
            return Err(error);
        }
    };
    let attempt = context.counters.record_page(page.bytes as u64);

    let hrefs = extract_hrefs(&page.body);
    let link_count = hrefs.len();
    context.counters.record_links(link_count as u64);

    for href in hrefs {
        let target = match canonicalize(url.as_url(), &href) {
            Ok(target) => target,
            Err(e) => {
                tracing::trace!("Skipping href {:?} on {}: {}", href, url, e);
                continue;
            }
        };

        let scope = context.scope.classify(&target);
        let link = LinkRecord {
            source: url.clone(),
            target: target.clone(),
            scope,
        };

        match context.registry.record_link(link) {
            Recorded::NewlyInternal => {
                context
                    .events
                    .emit(CrawlEvent::discovered(scope, target.clone()));
                context.frontier.push(target);
            }
            Recorded::NewlyExternal => {
                context.events.emit(CrawlEvent::discovered(scope, target));
            }
            Recorded::AlreadyKnown => {}
        }
    }

    let elapsed = started.elapsed();
    tracing::debug!("Crawling end: {} ({} links) took {:?}", url, link_count, elapsed);
    context
        .events
        .emit(CrawlEvent::page_finished(url.clone(), elapsed, link_count));
    log_progress(context, attempt);

    Ok(link_count)
}

/// Logs a progress line when `attempt` lands on the progress interval
fn log_progress(context: &CrawlContext, attempt: u64) {
    if attempt % PROGRESS_INTERVAL == 0 {
        tracing::info!(
            "Progress: {} pages crawled, {} internal / {} external URLs, {} in frontier",
            attempt,
            context.registry.internal_len(),
            context.registry.external_len(),
            context.frontier.pending()
        );
    }
}

/// Internal URLs that never got a fetch attempt
///
/// Covers URLs still queued and URLs whose push was refused after the
/// frontier froze, as well as pages whose task was aborted mid-fetch.
fn unfetched_count(internal: &BTreeSet<CanonicalUrl>, counters: &CrawlCounters) -> usize {
    let attempted = usize::try_from(counters.pages_attempted()).unwrap_or(usize::MAX);
    internal.len().saturating_sub(attempted)
}

async fn join_workers(pool: &mut JoinSet<()>) {
    while let Some(result) = pool.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                tracing::error!("Crawl worker panicked: {}", e);
            }
        }
    }
}

/// Runs a complete crawl operation
///
/// # Example
///
/// ```no_run
/// use link_sweep::config::Config;
/// use link_sweep::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::with_seed("https://example.com/");
/// let report = run_crawl(config, CancellationToken::new()).await?;
/// println!("{} URLs discovered", report.total_urls());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    cancel: CancellationToken,
) -> Result<CrawlReport, LinkSweepError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run(cancel).await
}
