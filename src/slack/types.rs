//! Wire types for the Slack Web API methods the crawler calls

use serde::Deserialize;

/// One page of a cursor-paginated collection
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// Cursor for the next page; empty when this is the last page
    pub next_cursor: String,
}

impl<T> Fragment<T> {
    /// Creates a page with the given items and continuation cursor
    pub fn new(items: Vec<T>, next_cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.into(),
        }
    }

    /// Whether this page is the final one
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }
}

/// A channel (public, private, group or IM) as returned by `conversations.list`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    /// Member ID of the user who created the channel
    pub creator: String,
    pub is_channel: bool,
    pub is_group: bool,
    pub is_im: bool,
    pub is_private: bool,
    /// Creation time in Unix seconds
    pub created: i64,
    pub is_archived: bool,
    pub is_general: bool,
}

/// A single history event from `conversations.history`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: Option<String>,
    pub user: String,
    pub bot_id: Option<String>,
    pub text: String,
    pub ts: String,
}

impl Message {
    /// The member this event is attributed to
    ///
    /// Bot messages carry no `user`, so they are attributed to their `bot_id`.
    pub fn member_id(&self) -> &str {
        if !self.user.is_empty() {
            return &self.user;
        }
        self.bot_id.as_deref().unwrap_or("")
    }
}

/// Profile section of a user record
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    pub real_name: String,
    pub display_name: String,
    pub real_name_normalized: String,
}

/// A user record from `users.info`
///
/// `UserInfo::default()` is the zero identity used when a lookup fails.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub profile: ProfileData,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_bot: bool,
    pub deleted: bool,
}

/// The `ok`/`error` pair every Web API response carries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiStatus {
    pub ok: bool,
    pub error: Option<String>,
}

/// Pagination block attached to list responses
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMetadata {
    pub next_cursor: String,
}

/// Access to the status part of a decoded response
pub trait ApiResponse {
    fn status(&self) -> &ApiStatus;
}

/// Response body of `conversations.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelsResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub channels: Vec<ChannelInfo>,
    pub response_metadata: ResponseMetadata,
}

/// Response body of `conversations.history`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HistoryResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub messages: Vec<Message>,
    pub response_metadata: ResponseMetadata,
}

/// Response body of `users.info`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfoResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub user: UserInfo,
}

impl ApiResponse for ChannelsResponse {
    fn status(&self) -> &ApiStatus {
        &self.status
    }
}

impl ApiResponse for HistoryResponse {
    fn status(&self) -> &ApiStatus {
        &self.status
    }
}

impl ApiResponse for UserInfoResponse {
    fn status(&self) -> &ApiStatus {
        &self.status
    }
}
