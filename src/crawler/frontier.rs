//! Frontier - the queue of internal URLs awaiting a fetch
//!
//! This module handles:
//! - FIFO ordering, which gives breadth-first traversal
//! - Admitting each URL at most once over the whole crawl
//! - Tracking in-flight work through [`Lease`] guards
//! - Suspending idle workers until work arrives or the crawl drains
//! - Optional per-host concurrency and total dispatch caps

use crate::url::CanonicalUrl;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Caps applied when handing out work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierLimits {
    /// Maximum leases outstanding per host (`host:port`)
    pub per_host: Option<usize>,

    /// Maximum leases handed out over the frontier's lifetime
    pub max_dispatch: Option<usize>,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<CanonicalUrl>,
    enqueued: HashSet<CanonicalUrl>,
    in_flight: usize,
    host_in_flight: HashMap<String, usize>,
    dispatched: usize,
    frozen: bool,
}

impl FrontierState {
    fn dispatch_exhausted(&self, limits: &FrontierLimits) -> bool {
        limits
            .max_dispatch
            .map_or(false, |max| self.dispatched >= max)
    }

    fn is_drained(&self, limits: &FrontierLimits) -> bool {
        self.in_flight == 0
            && (self.frozen || self.queue.is_empty() || self.dispatch_exhausted(limits))
    }

    /// Removes the first queued URL whose host has a free slot
    fn take_ready(&mut self, limits: &FrontierLimits) -> Option<(CanonicalUrl, String)> {
        if self.frozen || self.dispatch_exhausted(limits) {
            return None;
        }

        let position = match limits.per_host {
            None => (!self.queue.is_empty()).then_some(0),
            Some(cap) => self.queue.iter().position(|url| {
                self.host_in_flight
                    .get(&url.authority())
                    .copied()
                    .unwrap_or(0)
                    < cap
            }),
        }?;

        let url = self.queue.remove(position)?;
        let host = url.authority();

        self.in_flight += 1;
        self.dispatched += 1;
        *self.host_in_flight.entry(host.clone()).or_insert(0) += 1;

        Some((url, host))
    }

    fn release(&mut self, host: &str) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(count) = self.host_in_flight.get_mut(host) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.host_in_flight.remove(host);
            }
        }
    }
}

/// Shared work queue of internal URLs
///
/// Always used behind an `Arc`: leases keep a handle back to the frontier so
/// the in-flight slot is released even if the holder panics.
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    limits: FrontierLimits,
    notify: Notify,
}

/// One unit of in-flight work
///
/// Dropping the lease marks the URL as finished and wakes waiting workers.
pub struct Lease {
    url: CanonicalUrl,
    host: String,
    frontier: Arc<Frontier>,
}

impl Lease {
    pub fn url(&self) -> &CanonicalUrl {
        &self.url
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("url", &self.url).finish()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.frontier.lock().release(&self.host);
        self.frontier.notify.notify_waiters();
    }
}

impl Frontier {
    /// Creates an unbounded frontier
    pub fn new() -> Arc<Self> {
        Self::with_limits(FrontierLimits::default())
    }

    pub fn with_limits(limits: FrontierLimits) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FrontierState::default()),
            limits,
            notify: Notify::new(),
        })
    }

    /// Enqueues `url` at the back
    ///
    /// Returns false, and does nothing, if the URL was ever enqueued before or
    /// the frontier is frozen.
    pub fn push(&self, url: CanonicalUrl) -> bool {
        {
            let mut state = self.lock();
            if state.frozen || !state.enqueued.insert(url.clone()) {
                return false;
            }
            state.queue.push_back(url);
        }

        self.notify.notify_waiters();
        true
    }

    /// Takes the next ready URL without waiting
    pub fn pop(self: &Arc<Self>) -> Option<Lease> {
        let (url, host) = self.lock().take_ready(&self.limits)?;
        Some(Lease {
            url,
            host,
            frontier: Arc::clone(self),
        })
    }

    /// Waits for the next ready URL
    ///
    /// Returns `None` once the frontier is drained or frozen, or when
    /// `cancel` fires.
    pub async fn next(self: &Arc<Self>, cancel: &CancellationToken) -> Option<Lease> {
        loop {
            // Register interest before inspecting state so a push or release
            // between the check and the await is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(lease) = self.pop() {
                return Some(lease);
            }

            {
                let state = self.lock();
                if state.frozen || state.is_drained(&self.limits) {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Resolves once no work is queued or in flight
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_drained() {
                return;
            }

            notified.await;
        }
    }

    /// True when nothing is dispatchable and no lease is outstanding
    pub fn is_drained(&self) -> bool {
        self.lock().is_drained(&self.limits)
    }

    /// Stops all further pushes and pops; queued URLs stay unfetched
    pub fn freeze(&self) {
        self.lock().frozen = true;
        self.notify.notify_waiters();
    }

    pub fn is_frozen(&self) -> bool {
        self.lock().frozen
    }

    /// Number of URLs queued and not yet leased
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of leases outstanding
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// Number of leases handed out so far
    pub fn dispatched(&self) -> usize {
        self.lock().dispatched
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
