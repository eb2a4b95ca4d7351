use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregate crawl counters shared by every worker
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    pages_attempted: AtomicU64,
    bytes_fetched: AtomicU64,
    links_seen: AtomicU64,
}

/// Point-in-time copy of [`CrawlCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Pages fetched successfully
    pub pages_fetched: u64,
    /// Pages whose fetch failed
    pub pages_failed: u64,
    /// Body bytes read across all successful fetches
    pub bytes_fetched: u64,
    /// Hrefs extracted, valid or not, before deduplication
    pub links_seen: u64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful fetch of `bytes` body bytes
    ///
    /// Returns this page's position among all attempts, starting at 1.
    pub fn record_page(&self, bytes: u64) -> u64 {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.bytes_fetched.fetch_add(bytes, Ordering::Relaxed);
        self.next_attempt()
    }

    /// Records a failed fetch; returns the attempt number like [`record_page`](Self::record_page)
    pub fn record_failure(&self) -> u64 {
        self.pages_failed.fetch_add(1, Ordering::Relaxed);
        self.next_attempt()
    }

    fn next_attempt(&self) -> u64 {
        self.pages_attempted.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_links(&self, count: u64) {
        self.links_seen.fetch_add(count, Ordering::Relaxed);
    }

    /// Pages attempted so far, successful or not
    pub fn pages_attempted(&self) -> u64 {
        self.pages_attempted.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            links_seen: self.links_seen.load(Ordering::Relaxed),
        }
    }
}
