use serde::Deserialize;

/// Default Slack Web API base URL
pub const DEFAULT_API_URL: &str = "https://slack.com/api/";

/// Main configuration structure for Slack-Census
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Slack Web API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Base URL of the Web API, including the trailing slash
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Access token sent as a bearer credential
    #[serde(default)]
    pub token: String,

    /// Number of items requested per page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

/// Crawler throttling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum spacing between steady-state API calls (milliseconds)
    #[serde(rename = "rate-interval-ms", default = "default_rate_interval_ms")]
    pub rate_interval_ms: u64,

    /// Number of API calls allowed back-to-back before throttling kicks in
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// Status server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the status server listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> u32 {
    200
}

fn default_rate_interval_ms() -> u64 {
    100
}

fn default_burst() -> u32 {
    3
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: String::new(),
            page_size: default_page_size(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_interval_ms: default_rate_interval_ms(),
            burst: default_burst(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}
