use crate::config::types::{Config, CrawlerConfig, ServerConfig, SlackConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_slack_config(&config.slack)?;
    validate_crawler_config(&config.crawler)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates Slack API configuration
fn validate_slack_config(config: &SlackConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.api_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid api-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "api-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token cannot be empty (set it in [slack] or via SLACK_TOKEN)".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 1000, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates crawler throttling configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.rate_interval_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "rate-interval-ms must be >= 1ms, got {}ms",
            config.rate_interval_ms
        )));
    }

    if config.burst < 1 || config.burst > 100 {
        return Err(ConfigError::Validation(format!(
            "burst must be between 1 and 100, got {}",
            config.burst
        )));
    }

    Ok(())
}

/// Validates status server configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind-address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;

    Ok(())
}
