use crate::summary::member::{ChannelMember, MemberInfo};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Concurrency-safe map from [`ChannelMember`] to [`MemberInfo`]
///
/// Every key sits behind one mutex. Workers share the store through an `Arc`
/// and only ever mutate it via [`update_atomic`](Self::update_atomic).
#[derive(Debug, Default)]
pub struct ChannelSummaries {
    entries: Mutex<HashMap<ChannelMember, MemberInfo>>,
}

impl ChannelSummaries {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // The map is only written after `f` returns, so a poisoned lock still
    // guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<ChannelMember, MemberInfo>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the value for `key`, applies `f` and writes the result back
    ///
    /// Absent keys read as `MemberInfo::default()`. The whole read-modify-write
    /// runs in a single critical section that serializes all keys.
    pub fn update_atomic<F>(&self, key: ChannelMember, f: F)
    where
        F: FnOnce(MemberInfo) -> MemberInfo,
    {
        let mut entries = self.lock();
        let current = entries.get(&key).cloned().unwrap_or_default();
        entries.insert(key, f(current));
    }

    /// Merges a batch of partial results into the store
    ///
    /// Keys are merged one at a time, each in its own critical section. A
    /// concurrent reader can observe part of a batch applied.
    pub fn merge_atomic(&self, batch: HashMap<ChannelMember, MemberInfo>) {
        for (key, info) in batch {
            self.update_atomic(key, |current| current.merge(&info));
        }
    }

    /// Returns the current value for `key`, if any
    pub fn get(&self, key: &ChannelMember) -> Option<MemberInfo> {
        self.lock().get(key).cloned()
    }

    /// Number of (channel, member) entries
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been merged yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the current entries, sorted by channel then member
    pub fn snapshot(&self) -> Vec<(ChannelMember, MemberInfo)> {
        let mut entries: Vec<_> = self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
