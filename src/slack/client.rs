//! HTTP client for the Slack Web API
//!
//! This module handles all outbound HTTP requests, including:
//! - Building the reqwest client with a proper user agent
//! - Building method URLs and pagination query parameters
//! - Decoding JSON bodies and classifying failures

use crate::config::SlackConfig;
use crate::slack::types::{
    ApiResponse, ChannelInfo, ChannelsResponse, Fragment, HistoryResponse, Message, UserInfo,
    UserInfoResponse,
};
use crate::slack::SlackApi;
use crate::ScrapeError;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Web API method listing channels
pub const CHANNELS: &str = "conversations.list";

/// Web API method returning a channel's message history
pub const CHANNEL_HISTORY: &str = "conversations.history";

/// Web API method returning a user's profile
pub const USERS_INFO: &str = "users.info";

/// Builds an HTTP client with proper configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("slack-census/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Slack Web API client
///
/// The token is sent as a bearer credential, never as a query parameter, so
/// request URLs are safe to log and to embed in errors.
#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
    api_url: String,
    token: String,
    page_size: u32,
}

impl SlackClient {
    /// Creates a client from the `[slack]` configuration table
    pub fn new(config: &SlackConfig) -> Result<Self, ScrapeError> {
        Ok(Self::with_client(build_http_client()?, config))
    }

    /// Creates a client around an existing reqwest client
    pub fn with_client(client: Client, config: &SlackConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            page_size: config.page_size,
        }
    }

    /// URL of the channel list method
    pub fn channels_url(&self) -> String {
        format!("{}{}", self.api_url, CHANNELS)
    }

    /// URL of the channel history method
    pub fn history_url(&self) -> String {
        format!("{}{}", self.api_url, CHANNEL_HISTORY)
    }

    /// URL of the user profile method
    pub fn user_info_url(&self) -> String {
        format!("{}{}", self.api_url, USERS_INFO)
    }

    fn page_query(&self, cursor: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.page_size.to_string())];
        if !cursor.is_empty() {
            query.push(("cursor", cursor.to_string()));
        }
        query
    }

    /// Performs a GET on `url` and decodes the body as `R`
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Connection/timeout failure | `ScrapeError::Http` |
    /// | Non-2xx status | `ScrapeError::Status` |
    /// | Body is not the expected JSON | `ScrapeError::Decode` |
    /// | Body has `"ok": false` | `ScrapeError::Api` |
    async fn get_json<R>(
        &self,
        method: &str,
        url: String,
        query: &[(&'static str, String)],
    ) -> Result<R, ScrapeError>
    where
        R: DeserializeOwned + ApiResponse,
    {
        tracing::trace!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| ScrapeError::Http {
            url: url.clone(),
            source,
        })?;

        let decoded: R =
            serde_json::from_str(&body).map_err(|source| ScrapeError::Decode { url, source })?;

        let api_status = decoded.status();
        if !api_status.ok {
            return Err(ScrapeError::Api {
                method: method.to_string(),
                error: api_status
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        Ok(decoded)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn fetch_channels_page(&self, cursor: &str) -> Result<Fragment<ChannelInfo>, ScrapeError> {
        let query = self.page_query(cursor);
        let decoded: ChannelsResponse = self.get_json(CHANNELS, self.channels_url(), &query).await?;
        Ok(Fragment::new(
            decoded.channels,
            decoded.response_metadata.next_cursor,
        ))
    }

    async fn fetch_history_page(
        &self,
        channel_id: &str,
        cursor: &str,
    ) -> Result<Fragment<Message>, ScrapeError> {
        let mut query = self.page_query(cursor);
        query.push(("channel", channel_id.to_string()));
        let decoded: HistoryResponse = self
            .get_json(CHANNEL_HISTORY, self.history_url(), &query)
            .await?;
        Ok(Fragment::new(
            decoded.messages,
            decoded.response_metadata.next_cursor,
        ))
    }

    async fn fetch_user_info(&self, user_id: &str) -> Result<UserInfo, ScrapeError> {
        let query = [("user", user_id.to_string())];
        let decoded: UserInfoResponse = self
            .get_json(USERS_INFO, self.user_info_url(), &query)
            .await?;
        Ok(decoded.user)
    }
}
