//! Human-readable and JSON renderings of a summary snapshot

use crate::summary::member::{ChannelMember, MemberInfo};
use serde::Serialize;
use std::fmt::Write;

/// One flattened row of the aggregate, as served in JSON
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub channel_id: String,
    pub member_id: String,
    #[serde(flatten)]
    pub info: MemberInfo,
}

/// Flattens a snapshot into serializable rows, keeping its order
pub fn to_entries(snapshot: Vec<(ChannelMember, MemberInfo)>) -> Vec<SummaryEntry> {
    snapshot
        .into_iter()
        .map(|(key, info)| SummaryEntry {
            channel_id: key.channel_id,
            member_id: key.member_id,
            info,
        })
        .collect()
}

/// Renders a snapshot as an aligned plain-text table
pub fn render_text(snapshot: &[(ChannelMember, MemberInfo)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<14} {:>8} {:<7} {:<20} {:<4}",
        "CHANNEL", "MEMBER", "MESSAGES", "CREATOR", "JOINED", "LEFT"
    );

    for (key, info) in snapshot {
        let joined = info
            .join_time
            .map(|t| format!("{:.6}", t))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<14} {:<14} {:>8} {:<7} {:<20} {:<4}",
            key.channel_id,
            key.member_id,
            info.message_count,
            yes_no(info.is_creator),
            joined,
            yes_no(info.has_left)
        );
    }

    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
