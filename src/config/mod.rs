//! Configuration module for Link-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every setting has a default, so a file is optional: the binary
//! starts from [`Config::default`] and applies CLI overrides on top.
//!
//! # Example
//!
//! ```no_run
//! use link_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawl will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config, read_config};
pub use validation::validate;
