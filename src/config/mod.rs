//! Configuration module for Page-Sentry
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so a missing file or a partial file is fine.
//!
//! # Example
//!
//! ```no_run
//! use page_sentry::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("page-sentry.toml")).unwrap();
//! println!("Link verifier will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, StorageConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
