use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `slack.api-url`
pub const API_URL_ENV: &str = "SLACK_API";

/// Environment variable overriding `slack.token`
pub const TOKEN_ENV: &str = "SLACK_TOKEN";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing and before validation, so a
/// file without a token is fine as long as `SLACK_TOKEN` is set.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use slack_census::config::load_config;
///
/// let config = load_config(Path::new("census.toml")).unwrap();
/// println!("API: {}", config.slack.api_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    finish(config)
}

/// Builds a configuration from defaults and the process environment alone
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    finish(Config::default())
}

fn finish(mut config: Config) -> Result<Config, ConfigError> {
    apply_overrides(
        &mut config,
        std::env::var(API_URL_ENV).ok(),
        std::env::var(TOKEN_ENV).ok(),
    );
    validate(&config)?;
    Ok(config)
}

/// Applies API URL and token overrides, then normalizes the API URL
///
/// Empty override values are ignored. The API URL always ends up with a
/// trailing slash so method names can be appended directly.
pub fn apply_overrides(config: &mut Config, api_url: Option<String>, token: Option<String>) {
    if let Some(api_url) = api_url.filter(|v| !v.is_empty()) {
        config.slack.api_url = api_url;
    }
    if let Some(token) = token.filter(|v| !v.is_empty()) {
        config.slack.token = token;
    }
    if !config.slack.api_url.ends_with('/') {
        config.slack.api_url.push('/');
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be told apart by their configuration.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
