use crate::url::CanonicalUrl;
use serde::Deserialize;
use std::fmt;

/// Which side of the seed's domain boundary a URL falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Same domain as the seed - fetched and followed
    Internal,
    /// Any other domain - recorded, never fetched
    External,
}

impl Scope {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::External => "external",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a URL's authority is compared against the seed's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ScopeMatch {
    /// The seed authority appears anywhere in the URL authority.
    ///
    /// Loose: `evil-example.com.com` is internal to `example.com`.
    #[default]
    #[serde(rename = "substring")]
    Substring,

    /// The URL host is the seed host or one of its subdomains
    #[serde(rename = "host-suffix")]
    HostSuffix,
}

impl std::str::FromStr for ScopeMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substring" => Ok(Self::Substring),
            "host-suffix" => Ok(Self::HostSuffix),
            other => Err(format!(
                "unknown scope match '{}', expected 'substring' or 'host-suffix'",
                other
            )),
        }
    }
}

impl fmt::Display for ScopeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => f.write_str("substring"),
            Self::HostSuffix => f.write_str("host-suffix"),
        }
    }
}

/// The seed's domain captured at crawl start, plus the comparison to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRule {
    seed_authority: String,
    mode: ScopeMatch,
}

impl ScopeRule {
    /// Captures the scope of `seed`
    pub fn new(seed: &CanonicalUrl, mode: ScopeMatch) -> Self {
        Self {
            seed_authority: seed.authority(),
            mode,
        }
    }

    /// The seed authority (`host` or `host:port`) everything is compared to
    pub fn seed_authority(&self) -> &str {
        &self.seed_authority
    }

    pub fn mode(&self) -> ScopeMatch {
        self.mode
    }

    /// Classifies `url` relative to the captured seed
    pub fn classify(&self, url: &CanonicalUrl) -> Scope {
        let internal = match self.mode {
            ScopeMatch::Substring => url.authority().contains(&self.seed_authority),
            ScopeMatch::HostSuffix => matches_host_suffix(&self.seed_authority, url),
        };

        if internal {
            Scope::Internal
        } else {
            Scope::External
        }
    }
}

/// Classifies `url` against `seed_host` with the default substring rule
///
/// # Examples
///
/// ```
/// use link_sweep::url::{canonicalize_seed, classify, Scope};
///
/// let url = canonicalize_seed("https://blog.example.com/post").unwrap();
/// assert_eq!(classify("example.com", &url), Scope::Internal);
///
/// let url = canonicalize_seed("https://other.org/page").unwrap();
/// assert_eq!(classify("example.com", &url), Scope::External);
/// ```
pub fn classify(seed_host: &str, url: &CanonicalUrl) -> Scope {
    if url.authority().contains(seed_host) {
        Scope::Internal
    } else {
        Scope::External
    }
}

/// Matches the seed host itself or any subdomain of it
///
/// When the seed authority carries a port, the candidate must use the same
/// port.
fn matches_host_suffix(seed_authority: &str, url: &CanonicalUrl) -> bool {
    let (seed_host, seed_port) = match seed_authority.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => (host, Some(port)),
        _ => (seed_authority, None),
    };

    if let Some(port) = seed_port {
        if url.as_url().port().map(|p| p.to_string()).as_deref() != Some(port) {
            return false;
        }
    }

    let host = url.host();
    host == seed_host || host.ends_with(&format!(".{}", seed_host))
}
