use crate::UrlError;
use std::fmt;
use url::Url;

/// Schemes the fetcher knows how to retrieve
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// A normalized absolute URL: scheme, authority and path only
///
/// Query strings and fragments never survive canonicalization, so two hrefs
/// that differ only in those parts (or in relative vs absolute form) compare
/// equal. Values are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the lowercase host
    pub fn host(&self) -> &str {
        // Construction guarantees a host
        self.0.host_str().unwrap_or_default()
    }

    /// Returns the host plus the port when it is not the scheme default
    pub fn authority(&self) -> String {
        match self.0.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Canonicalizes an href found on the page at `base`
///
/// # Canonicalization Steps
///
/// 1. Resolve `href` against `base` (relative paths, `..` segments,
///    protocol-relative `//host/path`, fragment-only `#x`)
/// 2. Reject anything that is not `http` or `https`
/// 3. Reject URLs without a host
/// 4. Remove the query string and the fragment
///
/// Host lowercasing, default-port elision and dot-segment removal come from
/// the WHATWG parser itself.
///
/// # Examples
///
/// ```
/// use link_sweep::url::canonicalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = canonicalize(&base, "../page?x=1#y").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn canonicalize(base: &Url, href: &str) -> Result<CanonicalUrl, UrlError> {
    let resolved = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    from_resolved(resolved)
}

/// Canonicalizes an absolute seed URL
///
/// Applies the same rules as [`canonicalize`] with no base to resolve against.
pub fn canonicalize_seed(raw: &str) -> Result<CanonicalUrl, UrlError> {
    let parsed = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    from_resolved(parsed)
}

fn from_resolved(mut url: Url) -> Result<CanonicalUrl, UrlError> {
    if !FETCHABLE_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    // Only fails for hosts that cannot carry credentials, rejected above
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);

    Ok(CanonicalUrl(url))
}
