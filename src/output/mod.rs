//! Output module for crawl events and results
//!
//! This module handles:
//! - The event stream emitted while a crawl runs
//! - Rendering the final crawl report
//! - Writing the internal/external link lists to disk

mod events;
mod link_files;
mod report;

pub use events::{CollectingSink, CrawlEvent, EventSink, NullSink};
pub use link_files::{file_stem, write_link_files, LinkFiles};
pub use report::{format_report, print_report};
