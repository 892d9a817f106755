//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties everything together:
//! - Traversing the channel list
//! - Looking up each channel's creator
//! - Spawning one history worker per channel
//! - Funnelling every history page into the shared `ChannelSummaries`
//! - Failing fast when any page fetch fails

use crate::config::Config;
use crate::crawler::paginator::{paginate, Paginator};
use crate::crawler::progress::CrawlProgress;
use crate::crawler::rate_limiter::RateLimiter;
use crate::slack::{ChannelInfo, SlackApi, SlackClient, UserInfo};
use crate::summary::{summarize_messages, ChannelSummaries};
use crate::ScrapeError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};

/// Totals for a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Channels discovered and summarized
    pub channels: u64,

    /// History pages merged into the aggregate
    pub history_pages: u64,

    /// Messages folded into the aggregate
    pub messages: u64,

    /// Creator lookups that failed and fell back to an empty identity
    pub creator_lookup_failures: u64,
}

/// What a single channel worker contributed
#[derive(Debug, Default)]
struct WorkerStats {
    history_pages: u64,
    messages: u64,
}

impl CrawlStats {
    fn absorb(&mut self, worker: WorkerStats) {
        self.history_pages += worker.history_pages;
        self.messages += worker.messages;
    }
}

/// Main crawler coordinator structure
///
/// Holds shared handles only; every spawned worker gets its own clones of the
/// API client, rate limiter, summary store and progress tracker.
pub struct Coordinator<A: SlackApi + 'static> {
    api: Arc<A>,
    summaries: Arc<ChannelSummaries>,
    limiter: Arc<RateLimiter>,
    progress: Arc<CrawlProgress>,
}

impl<A: SlackApi + 'static> Coordinator<A> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `api` - Web API access used for every page and profile fetch
    /// * `summaries` - The store all workers merge into
    /// * `limiter` - Throttle applied to every outbound call
    pub fn new(api: Arc<A>, summaries: Arc<ChannelSummaries>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            api,
            summaries,
            limiter,
            progress: Arc::new(CrawlProgress::new()),
        }
    }

    /// Reports progress into an externally owned tracker
    pub fn with_progress(mut self, progress: Arc<CrawlProgress>) -> Self {
        self.progress = progress;
        self
    }

    /// The progress tracker this coordinator updates
    pub fn progress(&self) -> Arc<CrawlProgress> {
        Arc::clone(&self.progress)
    }

    /// Runs the crawl to completion
    ///
    /// Returns once every spawned channel worker has finished, so the summary
    /// store is final when this returns `Ok`. The first failed page fetch, at
    /// channel-list level or in any worker, aborts all outstanding workers and
    /// is returned as the error.
    pub async fn run(&self) -> Result<CrawlStats, ScrapeError> {
        tracing::info!("Starting crawl");
        self.progress.mark_running();
        let start_time = Instant::now();

        match self.traverse_channels().await {
            Ok(stats) => {
                self.progress.mark_complete();
                tracing::info!(
                    "Crawl completed: {} channels, {} history pages, {} messages in {:?}",
                    stats.channels,
                    stats.history_pages,
                    stats.messages,
                    start_time.elapsed()
                );
                Ok(stats)
            }
            Err(e) => {
                self.progress.mark_failed();
                tracing::error!("Crawl aborted after {:?}: {}", start_time.elapsed(), e);
                Err(e)
            }
        }
    }

    async fn traverse_channels(&self) -> Result<CrawlStats, ScrapeError> {
        let mut stats = CrawlStats::default();
        let mut workers: JoinSet<Result<WorkerStats, ScrapeError>> = JoinSet::new();
        let mut channels = self.channel_pages();

        loop {
            tokio::select! {
                page = channels.next() => {
                    let Some(page) = page else { break };
                    let page = match page {
                        Ok(page) => page,
                        Err(e) => {
                            tracing::error!("Error retrieving channels: {}", e);
                            abort_workers(&mut workers);
                            return Err(e);
                        }
                    };

                    for channel in page {
                        if self.summarize_channel(&mut workers, channel).await {
                            stats.creator_lookup_failures += 1;
                        }
                        stats.channels += 1;
                    }
                }
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    match flatten(joined) {
                        Ok(worker) => stats.absorb(worker),
                        Err(e) => {
                            abort_workers(&mut workers);
                            return Err(e);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Channel list exhausted, waiting for {} workers",
            workers.len()
        );

        while let Some(joined) = workers.join_next().await {
            match flatten(joined) {
                Ok(worker) => stats.absorb(worker),
                Err(e) => {
                    abort_workers(&mut workers);
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }

    fn channel_pages(&self) -> Paginator<ChannelInfo> {
        let api = Arc::clone(&self.api);
        let limiter = Arc::clone(&self.limiter);

        paginate(move |cursor| {
            let api = Arc::clone(&api);
            let limiter = Arc::clone(&limiter);
            async move {
                limiter.acquire().await;
                api.fetch_channels_page(&cursor).await
            }
        })
    }

    /// Looks up the channel's creator and spawns its history worker
    ///
    /// Returns `true` when the creator lookup failed.
    async fn summarize_channel(
        &self,
        workers: &mut JoinSet<Result<WorkerStats, ScrapeError>>,
        channel: ChannelInfo,
    ) -> bool {
        let (creator, lookup_failed) = self.lookup_creator(&channel).await;
        tracing::info!(
            "CHANNEL [{}]: {}. Created by: {}",
            channel.id,
            channel.name,
            creator.profile.real_name_normalized
        );

        let discovered = self.progress.channel_discovered();
        if discovered % 10 == 0 {
            let snapshot = self.progress.snapshot();
            tracing::info!(
                "Progress: {} channels discovered, {} finished, {} history pages merged",
                snapshot.channels_discovered,
                snapshot.channels_finished,
                snapshot.pages_merged
            );
        }

        workers.spawn(summarize_history(
            Arc::clone(&self.api),
            Arc::clone(&self.limiter),
            Arc::clone(&self.summaries),
            Arc::clone(&self.progress),
            channel,
        ));

        lookup_failed
    }

    async fn lookup_creator(&self, channel: &ChannelInfo) -> (UserInfo, bool) {
        if channel.creator.is_empty() {
            tracing::debug!("Channel {} has no creator", channel.id);
            return (UserInfo::default(), false);
        }

        self.limiter.acquire().await;
        match self.api.fetch_user_info(&channel.creator).await {
            Ok(user) => (user, false),
            Err(e) => {
                tracing::warn!(
                    "Failed to retrieve creator {} for channel {} due to {}",
                    channel.creator,
                    channel.name,
                    e
                );
                (UserInfo::default(), true)
            }
        }
    }
}

/// Traverses one channel's history and merges every page into `summaries`
async fn summarize_history<A: SlackApi + 'static>(
    api: Arc<A>,
    limiter: Arc<RateLimiter>,
    summaries: Arc<ChannelSummaries>,
    progress: Arc<CrawlProgress>,
    channel: ChannelInfo,
) -> Result<WorkerStats, ScrapeError> {
    let channel_id = channel.id.clone();
    let mut history = paginate(move |cursor| {
        let api = Arc::clone(&api);
        let limiter = Arc::clone(&limiter);
        let channel_id = channel_id.clone();
        async move {
            limiter.acquire().await;
            api.fetch_history_page(&channel_id, &cursor).await
        }
    });

    let mut stats = WorkerStats::default();
    while let Some(page) = history.next().await {
        let messages = page.map_err(|e| {
            tracing::error!(
                "Failed to retrieve messages for channel {} due to {}",
                channel.name,
                e
            );
            e
        })?;

        stats.history_pages += 1;
        stats.messages += messages.len() as u64;
        summaries.merge_atomic(summarize_messages(&channel.id, &messages));
        progress.page_merged();
    }

    progress.channel_finished();
    tracing::debug!(
        "Channel {} done: {} pages, {} messages",
        channel.id,
        stats.history_pages,
        stats.messages
    );
    Ok(stats)
}

fn flatten(
    joined: Result<Result<WorkerStats, ScrapeError>, JoinError>,
) -> Result<WorkerStats, ScrapeError> {
    joined.map_err(|e| ScrapeError::Worker(e.to_string()))?
}

fn abort_workers<T: 'static>(workers: &mut JoinSet<T>) {
    if !workers.is_empty() {
        tracing::warn!("Aborting {} outstanding channel workers", workers.len());
    }
    workers.abort_all();
}

/// Runs a complete crawl from configuration
///
/// Builds the HTTP client and rate limiter from `config` and runs a
/// [`Coordinator`] that merges into `summaries` and reports into `progress`.
///
/// # Example
///
/// ```no_run
/// use slack_census::config::load_config_from_env;
/// use slack_census::crawler::{run_crawl, CrawlProgress};
/// use slack_census::summary::ChannelSummaries;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config_from_env()?;
/// let summaries = Arc::new(ChannelSummaries::new());
/// run_crawl(&config, summaries, Arc::new(CrawlProgress::new())).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    summaries: Arc<ChannelSummaries>,
    progress: Arc<CrawlProgress>,
) -> Result<CrawlStats, ScrapeError> {
    let client = SlackClient::new(&config.slack)?;
    let limiter = RateLimiter::new(
        Duration::from_millis(config.crawler.rate_interval_ms),
        config.crawler.burst as usize,
    );

    Coordinator::new(Arc::new(client), summaries, Arc::new(limiter))
        .with_progress(progress)
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlPhase;
    use crate::slack::{Fragment, Message};
    use crate::summary::ChannelMember;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory workspace: pages keyed by cursor, histories keyed by channel then cursor
    #[derive(Default)]
    struct FakeSlack {
        channel_pages: HashMap<String, Result<Fragment<ChannelInfo>, String>>,
        histories: HashMap<String, HashMap<String, Result<Fragment<Message>, String>>>,
        users: HashMap<String, UserInfo>,
        stalled_history: Option<String>,
        channel_calls: Mutex<Vec<String>>,
        history_calls: AtomicUsize,
        call_times: Mutex<Vec<tokio::time::Instant>>,
    }

    impl FakeSlack {
        fn record_call(&self) {
            self.call_times
                .lock()
                .unwrap()
                .push(tokio::time::Instant::now());
        }
    }

    fn failure(method: &str, error: &str) -> ScrapeError {
        ScrapeError::Api {
            method: method.to_string(),
            error: error.to_string(),
        }
    }

    #[async_trait]
    impl SlackApi for FakeSlack {
        async fn fetch_channels_page(
            &self,
            cursor: &str,
        ) -> Result<Fragment<ChannelInfo>, ScrapeError> {
            self.record_call();
            self.channel_calls.lock().unwrap().push(cursor.to_string());
            match self.channel_pages.get(cursor) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(failure("conversations.list", e)),
                None => Err(failure("conversations.list", "invalid_cursor")),
            }
        }

        async fn fetch_history_page(
            &self,
            channel_id: &str,
            cursor: &str,
        ) -> Result<Fragment<Message>, ScrapeError> {
            self.record_call();
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.stalled_history.as_deref() == Some(channel_id) {
                std::future::pending::<()>().await;
            }
            match self.histories.get(channel_id).and_then(|h| h.get(cursor)) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(failure("conversations.history", e)),
                None => Err(failure("conversations.history", "channel_not_found")),
            }
        }

        async fn fetch_user_info(&self, user_id: &str) -> Result<UserInfo, ScrapeError> {
            self.record_call();
            self.users
                .get(user_id)
                .cloned()
                .ok_or_else(|| failure("users.info", "user_not_found"))
        }
    }

    fn channel(id: &str, creator: &str) -> ChannelInfo {
        ChannelInfo {
            id: id.to_string(),
            name: format!("name-{}", id),
            creator: creator.to_string(),
            ..ChannelInfo::default()
        }
    }

    fn messages(users: &[&str]) -> Vec<Message> {
        users
            .iter()
            .map(|u| Message {
                kind: "message".to_string(),
                user: u.to_string(),
                ..Message::default()
            })
            .collect()
    }

    fn history(pages: Vec<(&str, Vec<&str>, &str)>) -> HashMap<String, Result<Fragment<Message>, String>> {
        pages
            .into_iter()
            .map(|(cursor, users, next)| {
                (
                    cursor.to_string(),
                    Ok(Fragment::new(messages(&users), next)),
                )
            })
            .collect()
    }

    fn user(id: &str) -> UserInfo {
        UserInfo {
            id: id.to_string(),
            ..UserInfo::default()
        }
    }

    /// Channels A and B: A has two history pages (u1, u1 | u2), B one (u1)
    fn two_channel_workspace() -> FakeSlack {
        let mut fake = FakeSlack::default();
        fake.channel_pages.insert(
            String::new(),
            Ok(Fragment::new(vec![channel("A", "u1"), channel("B", "u2")], "")),
        );
        fake.histories.insert(
            "A".to_string(),
            history(vec![("", vec!["u1", "u1"], "a2"), ("a2", vec!["u2"], "")]),
        );
        fake.histories
            .insert("B".to_string(), history(vec![("", vec!["u1"], "")]));
        fake.users.insert("u1".to_string(), user("u1"));
        fake.users.insert("u2".to_string(), user("u2"));
        fake
    }

    fn coordinator(fake: FakeSlack) -> (Coordinator<FakeSlack>, Arc<ChannelSummaries>) {
        let summaries = Arc::new(ChannelSummaries::new());
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1), 100));
        (
            Coordinator::new(Arc::new(fake), Arc::clone(&summaries), limiter),
            summaries,
        )
    }

    fn count(summaries: &ChannelSummaries, channel: &str, member: &str) -> Option<u64> {
        summaries
            .get(&ChannelMember::new(channel, member))
            .map(|info| info.message_count)
    }

    #[tokio::test]
    async fn test_two_channel_scenario() {
        let (coordinator, summaries) = coordinator(two_channel_workspace());

        let stats = coordinator.run().await.unwrap();

        assert_eq!(count(&summaries, "A", "u1"), Some(2));
        assert_eq!(count(&summaries, "A", "u2"), Some(1));
        assert_eq!(count(&summaries, "B", "u1"), Some(1));
        assert_eq!(summaries.len(), 3);
        assert_eq!(
            stats,
            CrawlStats {
                channels: 2,
                history_pages: 3,
                messages: 4,
                creator_lookup_failures: 0,
            }
        );

        let progress = coordinator.progress().snapshot();
        assert_eq!(progress.phase, CrawlPhase::Complete);
        assert_eq!(progress.channels_discovered, 2);
        assert_eq!(progress.channels_finished, 2);
        assert_eq!(progress.pages_merged, 3);
    }

    #[tokio::test]
    async fn test_creator_lookup_failure_is_not_fatal() {
        let mut fake = two_channel_workspace();
        fake.users.clear();
        let (coordinator, summaries) = coordinator(fake);

        let stats = coordinator.run().await.unwrap();

        assert_eq!(stats.creator_lookup_failures, 2);
        assert_eq!(count(&summaries, "A", "u1"), Some(2));
        assert_eq!(count(&summaries, "B", "u1"), Some(1));
    }

    #[tokio::test]
    async fn test_channel_page_error_stops_before_next_page() {
        let mut fake = FakeSlack::default();
        fake.channel_pages.insert(
            String::new(),
            Ok(Fragment::new(vec![channel("A", "")], "p2")),
        );
        fake.channel_pages
            .insert("p2".to_string(), Err("internal_error".to_string()));
        fake.channel_pages.insert(
            "p3".to_string(),
            Ok(Fragment::new(vec![channel("C", "")], "")),
        );
        fake.histories
            .insert("A".to_string(), history(vec![("", vec!["u1"], "")]));
        let (coordinator, summaries) = coordinator(fake);

        let result = coordinator.run().await;

        assert!(matches!(result, Err(ScrapeError::Api { .. })));
        assert_eq!(coordinator.progress().phase(), CrawlPhase::Failed);
        assert_eq!(
            *coordinator.api.channel_calls.lock().unwrap(),
            vec![String::new(), "p2".to_string()]
        );
        assert_eq!(count(&summaries, "C", "u1"), None);
    }

    #[tokio::test]
    async fn test_channel_page_error_aborts_running_workers() {
        let mut fake = FakeSlack::default();
        fake.channel_pages.insert(
            String::new(),
            Ok(Fragment::new(vec![channel("A", "")], "p2")),
        );
        fake.channel_pages
            .insert("p2".to_string(), Err("internal_error".to_string()));
        fake.stalled_history = Some("A".to_string());
        let (coordinator, _summaries) = coordinator(fake);

        let result = tokio::time::timeout(Duration::from_secs(5), coordinator.run()).await;

        assert!(matches!(result, Ok(Err(ScrapeError::Api { .. }))));
    }

    #[tokio::test]
    async fn test_history_error_is_fatal_for_whole_crawl() {
        let mut fake = two_channel_workspace();
        fake.histories.get_mut("A").unwrap().insert(
            "a2".to_string(),
            Err("ratelimited".to_string()),
        );
        let (coordinator, _summaries) = coordinator(fake);

        match coordinator.run().await {
            Err(ScrapeError::Api { method, error }) => {
                assert_eq!(method, "conversations.history");
                assert_eq!(error, "ratelimited");
            }
            other => panic!("expected history failure, got {:?}", other),
        }
        assert_eq!(coordinator.progress().phase(), CrawlPhase::Failed);
    }

    #[tokio::test]
    async fn test_empty_workspace_completes() {
        let mut fake = FakeSlack::default();
        fake.channel_pages
            .insert(String::new(), Ok(Fragment::new(vec![], "")));
        let (coordinator, summaries) = coordinator(fake);

        let stats = coordinator.run().await.unwrap();

        assert_eq!(stats, CrawlStats::default());
        assert!(summaries.is_empty());
        assert_eq!(coordinator.api.history_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_many_channels_across_pages() {
        let mut fake = FakeSlack::default();
        for page in 0..3 {
            let cursor = if page == 0 { String::new() } else { format!("p{}", page) };
            let next = if page == 2 { String::new() } else { format!("p{}", page + 1) };
            let channels: Vec<_> = (0..5)
                .map(|i| channel(&format!("C{}{}", page, i), ""))
                .collect();
            for c in &channels {
                fake.histories.insert(
                    c.id.clone(),
                    history(vec![("", vec!["u1", "u2"], "h2"), ("h2", vec!["u1"], "")]),
                );
            }
            fake.channel_pages
                .insert(cursor, Ok(Fragment::new(channels, next)));
        }
        let (coordinator, summaries) = coordinator(fake);

        let stats = coordinator.run().await.unwrap();

        assert_eq!(stats.channels, 15);
        assert_eq!(stats.history_pages, 30);
        assert_eq!(summaries.len(), 30);
        assert_eq!(count(&summaries, "C24", "u1"), Some(2));
        assert_eq!(count(&summaries, "C03", "u2"), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_page_fetch_waits_for_the_limiter() {
        let mut fake = two_channel_workspace();
        fake.channel_pages.clear();
        fake.channel_pages.insert(
            String::new(),
            Ok(Fragment::new(vec![channel("A", "")], "c2")),
        );
        fake.channel_pages.insert(
            "c2".to_string(),
            Ok(Fragment::new(vec![channel("B", "")], "")),
        );
        let interval = Duration::from_millis(100);
        let coordinator = Coordinator::new(
            Arc::new(fake),
            Arc::new(ChannelSummaries::new()),
            Arc::new(RateLimiter::new(interval, 1)),
        );

        let start = tokio::time::Instant::now();
        let stats = coordinator.run().await.unwrap();

        // Two channel pages and three history pages, no creator lookups
        assert_eq!(stats.history_pages, 3);
        let mut calls = coordinator.api.call_times.lock().unwrap().clone();
        assert_eq!(calls.len(), 5);
        calls.sort();
        for pair in calls.windows(2) {
            assert!(
                pair[1] - pair[0] >= interval,
                "calls only {:?} apart",
                pair[1] - pair[0]
            );
        }
        assert!(start.elapsed() >= interval * 4);
    }
}
