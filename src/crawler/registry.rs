//! Visited registry - the single source of truth for "already discovered"
//!
//! Every canonical URL the crawl encounters is recorded here exactly once,
//! in exactly one of two disjoint sets. The first classification of a URL
//! wins; later encounters are no-ops.

use crate::url::{CanonicalUrl, Scope};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// An edge in the crawl graph, consumed once by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Page the link was found on
    pub source: CanonicalUrl,
    /// Where the link points
    pub target: CanonicalUrl,
    /// Scope of `target`
    pub scope: Scope,
}

/// Outcome of [`VisitedRegistry::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// First sighting; classified internal
    NewlyInternal,
    /// First sighting; classified external
    NewlyExternal,
    /// Seen before, under whichever scope it got first
    AlreadyKnown,
}

impl Recorded {
    pub fn is_new(&self) -> bool {
        !matches!(self, Self::AlreadyKnown)
    }
}

#[derive(Debug, Default)]
struct VisitedSet {
    internal: HashSet<CanonicalUrl>,
    external: HashSet<CanonicalUrl>,
}

/// Consistent point-in-time export of the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedSnapshot {
    pub internal: BTreeSet<CanonicalUrl>,
    pub external: BTreeSet<CanonicalUrl>,
}

impl VisitedSnapshot {
    /// Total number of distinct URLs discovered
    pub fn total(&self) -> usize {
        self.internal.len() + self.external.len()
    }
}

/// Concurrency-safe store of every canonical URL seen
///
/// Check-and-insert happens under one lock, so exactly one caller ever
/// observes a `Newly*` outcome for a given URL.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    inner: Mutex<VisitedSet>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url` under `scope` unless it is already known
    pub fn record(&self, url: CanonicalUrl, scope: Scope) -> Recorded {
        let mut set = self.lock();

        if set.internal.contains(&url) || set.external.contains(&url) {
            return Recorded::AlreadyKnown;
        }

        match scope {
            Scope::Internal => {
                set.internal.insert(url);
                Recorded::NewlyInternal
            }
            Scope::External => {
                set.external.insert(url);
                Recorded::NewlyExternal
            }
        }
    }

    /// Records the target of an edge; the edge itself is not retained
    pub fn record_link(&self, link: LinkRecord) -> Recorded {
        self.record(link.target, link.scope)
    }

    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        let set = self.lock();
        set.internal.contains(url) || set.external.contains(url)
    }

    pub fn internal_len(&self) -> usize {
        self.lock().internal.len()
    }

    pub fn external_len(&self) -> usize {
        self.lock().external.len()
    }

    pub fn len(&self) -> usize {
        let set = self.lock();
        set.internal.len() + set.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exports both sets, sorted, under a single lock acquisition
    pub fn snapshot(&self) -> VisitedSnapshot {
        let set = self.lock();
        VisitedSnapshot {
            internal: set.internal.iter().cloned().collect(),
            external: set.external.iter().cloned().collect(),
        }
    }

    // No critical section can leave the sets half-updated, so a poisoned
    // lock still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, VisitedSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
