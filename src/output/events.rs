//! Crawl events and the sinks that consume them
//!
//! The engine never prints. Everything a reporting layer might want to show
//! is emitted as a [`CrawlEvent`] through an [`EventSink`].

use crate::url::{CanonicalUrl, Scope};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Something observable that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// A URL was classified for the first time
    Discovered {
        timestamp: DateTime<Utc>,
        scope: Scope,
        url: CanonicalUrl,
    },

    /// A worker started fetching a page
    PageStarted {
        timestamp: DateTime<Utc>,
        url: CanonicalUrl,
    },

    /// A page was fetched and its links processed
    PageFinished {
        timestamp: DateTime<Utc>,
        url: CanonicalUrl,
        elapsed: Duration,
        /// Hrefs extracted from the page, before deduplication
        links: usize,
    },

    /// A page could not be fetched; it contributes no links
    PageFailed {
        timestamp: DateTime<Utc>,
        url: CanonicalUrl,
        error: String,
    },
}

impl CrawlEvent {
    pub fn discovered(scope: Scope, url: CanonicalUrl) -> Self {
        Self::Discovered {
            timestamp: Utc::now(),
            scope,
            url,
        }
    }

    pub fn page_started(url: CanonicalUrl) -> Self {
        Self::PageStarted {
            timestamp: Utc::now(),
            url,
        }
    }

    pub fn page_finished(url: CanonicalUrl, elapsed: Duration, links: usize) -> Self {
        Self::PageFinished {
            timestamp: Utc::now(),
            url,
            elapsed,
            links,
        }
    }

    pub fn page_failed(url: CanonicalUrl, error: impl ToString) -> Self {
        Self::PageFailed {
            timestamp: Utc::now(),
            url,
            error: error.to_string(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Discovered { timestamp, .. }
            | Self::PageStarted { timestamp, .. }
            | Self::PageFinished { timestamp, .. }
            | Self::PageFailed { timestamp, .. } => *timestamp,
        }
    }

    pub fn url(&self) -> &CanonicalUrl {
        match self {
            Self::Discovered { url, .. }
            | Self::PageStarted { url, .. }
            | Self::PageFinished { url, .. }
            | Self::PageFailed { url, .. } => url,
        }
    }
}

/// Consumer of crawl events
///
/// Called from worker tasks, so implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: CrawlEvent) {}
}

/// Forwards events to a channel; a closed receiver drops them silently
impl EventSink for UnboundedSender<CrawlEvent> {
    fn emit(&self, event: CrawlEvent) {
        let _ = self.send(event);
    }
}

/// Buffers events in memory, mostly useful in tests and batch callers
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<CrawlEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event emitted so far, in emission order
    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: CrawlEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: CrawlEvent) {
        (**self).emit(event);
    }
}
