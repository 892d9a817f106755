//! Slack-Census: channel membership and activity statistics for a Slack workspace
//!
//! This crate crawls a workspace's channel list, every channel's message history
//! and the channel creators' profiles, folds the messages into per-(channel, member)
//! statistics and serves the aggregate over HTTP next to liveness/readiness checks.

pub mod config;
pub mod crawler;
pub mod server;
pub mod slack;
pub mod summary;

use thiserror::Error;

/// Main error type for Slack-Census operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Slack API method {method} failed: {error}")]
    Api { method: String, error: String },

    #[error("Channel worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Slack-Census operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlPhase, CrawlProgress, RateLimiter};
pub use slack::{SlackApi, SlackClient};
pub use summary::{ChannelMember, ChannelSummaries, MemberInfo};
