//! HTML link extraction
//!
//! Turns a fetched body into the raw `href` values of its anchors. Resolution
//! and validation happen later, in the canonicalizer; this stage only decides
//! which attribute values are candidates at all.

use scraper::{Html, Selector};
use std::vec;

/// Elements whose `href` is a navigable link
const ANCHOR_SELECTOR: &str = "a[href], area[href]";

/// The raw hrefs of one page, consumed once
#[derive(Debug)]
pub struct Hrefs {
    inner: vec::IntoIter<String>,
}

impl Iterator for Hrefs {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Hrefs {}

/// Extracts the `href` of every `<a>` and `<area>` element in `body`
///
/// # Extraction Rules
///
/// - Attribute values are yielded verbatim (trimmed), in document order
/// - Empty or whitespace-only `href`s are skipped
/// - Duplicates are kept; deduplication belongs to the registry
/// - Malformed markup never fails: html5ever recovers what it can
///
/// The document is parsed eagerly because the parsed tree cannot be held
/// across an `.await`; the returned iterator only hands out the results.
///
/// # Example
///
/// ```
/// use link_sweep::crawler::extract_hrefs;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="">Empty</a></body></html>"#;
/// let hrefs: Vec<String> = extract_hrefs(html).collect();
/// assert_eq!(hrefs, vec!["/page".to_string()]);
/// ```
pub fn extract_hrefs(body: &str) -> Hrefs {
    let document = Html::parse_document(body);

    let mut hrefs = Vec::new();
    if let Ok(selector) = Selector::parse(ANCHOR_SELECTOR) {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if !href.is_empty() {
                    hrefs.push(href.to_string());
                }
            }
        }
    }

    Hrefs {
        inner: hrefs.into_iter(),
    }
}
