//! Slack-Census main entry point
//!
//! Starts the crawl in the background and serves its progress and results on
//! the status server. A failed page fetch ends the process with a non-zero exit.

use clap::Parser;
use slack_census::config::{load_config_from_env, load_config_with_hash, Config};
use slack_census::crawler::{run_crawl, CrawlProgress};
use slack_census::server::{serve, StatusState};
use slack_census::summary::ChannelSummaries;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Slack-Census: channel membership and activity statistics
///
/// Crawls every channel's history in a Slack workspace, respecting a shared
/// rate limit, and serves per-channel member statistics over HTTP.
#[derive(Parser, Debug)]
#[command(name = "slack-census")]
#[command(version)]
#[command(about = "Channel membership and activity statistics for Slack", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults plus SLACK_API/SLACK_TOKEN when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the status server bind address
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    let addr: SocketAddr = config.server.bind_address.parse()?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summaries = Arc::new(ChannelSummaries::new());
    let progress = Arc::new(CrawlProgress::new());

    let crawl = tokio::spawn({
        let config = config.clone();
        let summaries = Arc::clone(&summaries);
        let progress = Arc::clone(&progress);
        async move { run_crawl(&config, summaries, progress).await }
    });
    let mut server = tokio::spawn(serve(
        addr,
        StatusState {
            summaries,
            progress,
        },
    ));

    tokio::select! {
        joined = &mut server => {
            // Only reachable when binding or serving failed
            joined??;
            return Ok(());
        }
        joined = crawl => match joined? {
            // The aggregate stays served after the crawl is done
            Ok(stats) => tracing::info!(
                "Crawl finished: {} channels, {} messages; serving results",
                stats.channels,
                stats.messages
            ),
            Err(e) => {
                tracing::error!("Crawl failed, exiting: {}", e);
                return Err(e.into());
            }
        },
    }

    server.await??;
    Ok(())
}

/// Loads configuration from the CLI path, or from defaults and environment
fn load(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults and environment");
            Ok(load_config_from_env()?)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("slack_census=info,warn"),
            1 => EnvFilter::new("slack_census=debug,info"),
            2 => EnvFilter::new("slack_census=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Slack-Census Dry Run ===\n");

    println!("Slack:");
    println!("  API URL: {}", config.slack.api_url);
    println!("  Token: {}", redact(&config.slack.token));
    println!("  Page size: {}", config.slack.page_size);

    println!("\nRate limit:");
    println!("  Burst: {}", config.crawler.burst);
    println!("  Interval: {}ms", config.crawler.rate_interval_ms);

    println!("\nStatus server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\n✓ Configuration is valid");
}

/// Shows a token prefix; short tokens are fully masked
fn redact(token: &str) -> String {
    if token.chars().count() <= 8 {
        return "********".to_string();
    }
    let visible: String = token.chars().take(5).collect();
    format!("{}…", visible)
}
