//! Per-(channel, member) aggregation
//!
//! This module holds the merge engine the crawl workers feed:
//! - `MemberInfo` and its commutative, associative merge
//! - `ChannelSummaries`, the lock-protected aggregate store
//! - `summarize_messages`, the pure fold from a history page to a merge batch
//! - Text/JSON renderings read by the status server

mod member;
mod report;
mod store;

pub use member::{ChannelMember, MemberInfo};
pub use report::{render_text, to_entries, SummaryEntry};
pub use store::ChannelSummaries;

use crate::slack::Message;
use std::collections::HashMap;

/// Summarizes a page of messages from a single channel into a merge batch
///
/// Each message contributes its one-event summary to the entry for
/// `(channel_id, message.member_id())`.
pub fn summarize_messages(
    channel_id: &str,
    messages: &[Message],
) -> HashMap<ChannelMember, MemberInfo> {
    let mut batch: HashMap<ChannelMember, MemberInfo> = HashMap::new();
    for message in messages {
        let key = ChannelMember::new(channel_id, message.member_id());
        let entry = batch.entry(key).or_default();
        *entry = entry.merge(&message.summarize());
    }
    batch
}
