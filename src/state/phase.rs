//! Crawl phase definitions
//!
//! A crawl moves strictly forward through these phases; the coordinator
//! rejects any other transition.

use std::fmt;

/// Represents the lifecycle phase of a single crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CrawlPhase {
    /// Seed is being canonicalized, recorded and fetched
    Seeding,

    /// Workers are pulling from the frontier
    Running,

    /// No new work is handed out; in-flight work is finishing
    Draining,

    /// Terminal: the visited snapshot has been taken
    Done,
}

impl CrawlPhase {
    /// Returns true if `next` is the only phase allowed to follow this one
    ///
    /// Seeding may also jump straight to Draining, when cancellation arrives
    /// before any worker was started.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Seeding, Self::Running)
                | (Self::Seeding, Self::Draining)
                | (Self::Running, Self::Draining)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true once the crawl can no longer make progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true while workers may still take new work
    pub fn accepts_work(&self) -> bool {
        matches!(self, Self::Seeding | Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeding => "seeding",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
