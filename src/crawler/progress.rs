use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Lifecycle of a crawl as seen from the status server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    /// Created, `run` not called yet
    Pending,
    /// Channels and histories are being traversed
    Running,
    /// Every worker finished; the aggregate is final
    Complete,
    /// A page fetch failed and the crawl was aborted
    Failed,
}

impl CrawlPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlPhase::Pending => "pending",
            CrawlPhase::Running => "running",
            CrawlPhase::Complete => "complete",
            CrawlPhase::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct Timeline {
    phase: CrawlPhase,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

/// Counters and phase of a crawl, shared between the coordinator and the server
#[derive(Debug)]
pub struct CrawlProgress {
    timeline: Mutex<Timeline>,
    channels_discovered: AtomicU64,
    channels_finished: AtomicU64,
    pages_merged: AtomicU64,
}

/// Point-in-time copy of [`CrawlProgress`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub phase: CrawlPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub channels_discovered: u64,
    pub channels_finished: u64,
    pub pages_merged: u64,
}

impl Default for CrawlProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlProgress {
    pub fn new() -> Self {
        Self {
            timeline: Mutex::new(Timeline {
                phase: CrawlPhase::Pending,
                started_at: None,
                finished_at: None,
            }),
            channels_discovered: AtomicU64::new(0),
            channels_finished: AtomicU64::new(0),
            pages_merged: AtomicU64::new(0),
        }
    }

    fn set_phase(&self, phase: CrawlPhase) {
        let mut timeline = self
            .timeline
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match phase {
            CrawlPhase::Running => timeline.started_at = Some(Utc::now()),
            CrawlPhase::Complete | CrawlPhase::Failed => timeline.finished_at = Some(Utc::now()),
            CrawlPhase::Pending => {}
        }
        timeline.phase = phase;
    }

    pub fn mark_running(&self) {
        self.set_phase(CrawlPhase::Running);
    }

    pub fn mark_complete(&self) {
        self.set_phase(CrawlPhase::Complete);
    }

    pub fn mark_failed(&self) {
        self.set_phase(CrawlPhase::Failed);
    }

    /// Records a channel handed to a worker; returns the new total
    pub fn channel_discovered(&self) -> u64 {
        self.channels_discovered.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn channel_finished(&self) {
        self.channels_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_merged(&self) {
        self.pages_merged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn phase(&self) -> CrawlPhase {
        self.snapshot().phase
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let timeline = self
            .timeline
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        ProgressSnapshot {
            phase: timeline.phase,
            started_at: timeline.started_at,
            finished_at: timeline.finished_at,
            channels_discovered: self.channels_discovered.load(Ordering::Relaxed),
            channels_finished: self.channels_finished.load(Ordering::Relaxed),
            pages_merged: self.pages_merged.load(Ordering::Relaxed),
        }
    }
}
