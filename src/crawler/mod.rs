//! Crawler module for traversing a Slack workspace
//!
//! This module contains the core crawling logic, including:
//! - Cursor pagination as background page producers
//! - Burst-then-steady rate limiting of outbound calls
//! - Per-channel history workers and their coordination
//! - Progress tracking for the status server

mod coordinator;
mod paginator;
mod progress;
mod rate_limiter;

pub use coordinator::{run_crawl, Coordinator, CrawlStats};
pub use paginator::{paginate, Page, Paginator};
pub use progress::{CrawlPhase, CrawlProgress, ProgressSnapshot};
pub use rate_limiter::RateLimiter;
