//! Configuration module for SiteHarvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the crawler defaults
//! (depth 2, 10 concurrent requests, 30 second page timeout).
//!
//! # Example
//!
//! ```no_run
//! use siteharvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("siteharvest.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, StorageBackend, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_ALLOWED_DEPTH};
