//! Crawl report rendering
//!
//! Formats a finished [`CrawlReport`] for the console.

use crate::crawler::CrawlReport;
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Formats the end-of-crawl report
///
/// Every line is stamped with `now`, which keeps the output reproducible
/// in tests.
pub fn format_report(report: &CrawlReport, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S");
    let mut out = String::new();

    let _ = writeln!(out, ">>>>>>>>>>>>>>>>>> Crawl Report <<<<<<<<<<<<<<<<<<");
    let _ = writeln!(out);
    let _ = writeln!(out, "[+] {} Seed: {}", stamp, report.seed);
    let _ = writeln!(
        out,
        "[+] {} Total Internal links: {}",
        stamp,
        report.internal.len()
    );
    let _ = writeln!(
        out,
        "[+] {} Total External links: {}",
        stamp,
        report.external.len()
    );
    let _ = writeln!(
        out,
        "[+] {} Total URLs: {}",
        stamp,
        report.total_urls()
    );
    let _ = writeln!(
        out,
        "[+] {} Pages fetched: {} ({} failed, {} bytes)",
        stamp,
        report.counters.pages_fetched,
        report.counters.pages_failed,
        report.counters.bytes_fetched
    );
    let _ = writeln!(
        out,
        "[+] {} Total Time to crawl: {:.2}(s)",
        stamp,
        report.elapsed.as_secs_f64()
    );

    if report.cancelled {
        let _ = writeln!(
            out,
            "[!] {} Crawl was cancelled; {} internal URLs were never fetched",
            stamp, report.unfetched
        );
    }

    out
}

/// Prints the end-of-crawl report to stdout
pub fn print_report(report: &CrawlReport) {
    println!();
    print!("{}", format_report(report, Utc::now()));
}
