//! Configuration module for Slack-Census
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! with `SLACK_API` / `SLACK_TOKEN` environment overrides applied on top.
//!
//! # Example
//!
//! ```no_run
//! use slack_census::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("census.toml")).unwrap();
//! println!("Burst size: {}", config.crawler.burst);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ServerConfig, SlackConfig, DEFAULT_API_URL};

// Re-export parser functions
pub use parser::{
    apply_overrides, compute_config_hash, load_config, load_config_from_env,
    load_config_with_hash, API_URL_ENV, TOKEN_ENV,
};
pub use validation::validate;
