//! URL handling module for Link-Sweep
//!
//! This module turns raw hrefs into comparable [`CanonicalUrl`] values and
//! decides which side of the seed's domain boundary each one falls on. Both
//! halves are pure: no I/O, no shared state.

mod canonical;
mod scope;

pub use canonical::{canonicalize, canonicalize_seed, CanonicalUrl};
pub use scope::{classify, Scope, ScopeMatch, ScopeRule};
