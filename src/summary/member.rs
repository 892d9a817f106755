use crate::slack::Message;
use serde::Serialize;

/// A relation between a channel and one of its members
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChannelMember {
    pub channel_id: String,
    pub member_id: String,
}

impl ChannelMember {
    pub fn new(channel_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            member_id: member_id.into(),
        }
    }
}

/// Aggregated information for a [`ChannelMember`]
///
/// `MemberInfo::default()` is the identity of [`MemberInfo::merge`]: no flags set,
/// no join time, zero messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemberInfo {
    /// Whether the member created the channel
    pub is_creator: bool,

    /// Earliest known join time (Slack `ts`, seconds); `None` when unknown
    pub join_time: Option<f64>,

    /// Number of history events attributed to the member
    pub message_count: u64,

    /// Whether the member has left the channel
    pub has_left: bool,
}

impl MemberInfo {
    /// Combines two observations of the same member
    ///
    /// Flags are OR-ed, message counts summed and the earliest known join time
    /// kept. The operation is commutative and associative, so the order in
    /// which concurrent workers contribute never changes the result.
    pub fn merge(&self, other: &MemberInfo) -> MemberInfo {
        MemberInfo {
            is_creator: self.is_creator || other.is_creator,
            join_time: earliest(self.join_time, other.join_time),
            message_count: self.message_count + other.message_count,
            has_left: self.has_left || other.has_left,
        }
    }
}

fn earliest(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl Message {
    /// Summarizes a single history event
    ///
    /// A bare event only counts as one message. Join, leave and creator
    /// information is not derived from event subtypes.
    pub fn summarize(&self) -> MemberInfo {
        MemberInfo {
            message_count: 1,
            ..MemberInfo::default()
        }
    }
}
