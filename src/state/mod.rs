//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The Seeding → Running → Draining → Done lifecycle
//! - `CrawlCounters`: Lock-free aggregate counters updated by every worker

mod counters;
mod phase;

// Re-export main types
pub use counters::{CounterSnapshot, CrawlCounters};
pub use phase::CrawlPhase;
