//! Slack Web API access
//!
//! The crawler only ever talks to Slack through the [`SlackApi`] trait, so the
//! HTTP client can be swapped for an in-memory workspace in tests.

mod client;
pub mod types;

pub use client::{build_http_client, SlackClient, CHANNELS, CHANNEL_HISTORY, USERS_INFO};
pub use types::{ChannelInfo, Fragment, Message, ProfileData, UserInfo};

use crate::ScrapeError;
use async_trait::async_trait;

/// The three Web API calls the crawl needs
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Fetches one page of the channel list, starting after `cursor`
    async fn fetch_channels_page(&self, cursor: &str) -> Result<Fragment<ChannelInfo>, ScrapeError>;

    /// Fetches one page of `channel_id`'s message history, starting after `cursor`
    async fn fetch_history_page(
        &self,
        channel_id: &str,
        cursor: &str,
    ) -> Result<Fragment<Message>, ScrapeError>;

    /// Fetches the profile of a single member
    async fn fetch_user_info(&self, user_id: &str) -> Result<UserInfo, ScrapeError>;
}
