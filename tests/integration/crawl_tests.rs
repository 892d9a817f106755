//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Slack Web API and run the
//! full crawl cycle end-to-end through the HTTP client.

use slack_census::config::{Config, CrawlerConfig, ServerConfig, SlackConfig};
use slack_census::crawler::{run_crawl, CrawlPhase, CrawlProgress};
use slack_census::summary::{ChannelMember, ChannelSummaries};
use slack_census::ScrapeError;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    Config {
        slack: SlackConfig {
            api_url: format!("{}/api/", base_url),
            token: "xoxb-test".to_string(),
            page_size: 100,
        },
        crawler: CrawlerConfig {
            rate_interval_ms: 5, // Very short for testing
            burst: 3,
        },
        server: ServerConfig::default(),
    }
}

fn channels_body(channels: &[(&str, &str)], next_cursor: &str) -> String {
    let channels: Vec<_> = channels
        .iter()
        .map(|(id, creator)| {
            serde_json::json!({"id": id, "name": format!("chan-{}", id), "creator": creator})
        })
        .collect();
    serde_json::json!({
        "ok": true,
        "channels": channels,
        "response_metadata": {"next_cursor": next_cursor}
    })
    .to_string()
}

fn history_body(users: &[&str], next_cursor: &str) -> String {
    let messages: Vec<_> = users
        .iter()
        .enumerate()
        .map(|(i, user)| {
            serde_json::json!({"type": "message", "user": user, "text": "hi", "ts": format!("{}.0", i)})
        })
        .collect();
    serde_json::json!({
        "ok": true,
        "messages": messages,
        "response_metadata": {"next_cursor": next_cursor}
    })
    .to_string()
}

async fn mount_user(server: &MockServer, id: &str, real_name: &str) {
    Mock::given(method("GET"))
        .and(path("/api/users.info"))
        .and(query_param("user", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            serde_json::json!({
                "ok": true,
                "user": {"id": id, "name": id, "profile": {"real_name_normalized": real_name}}
            })
            .to_string(),
        ))
        .mount(server)
        .await;
}

async fn mount_history(
    server: &MockServer,
    channel: &str,
    cursor: Option<&str>,
    users: &[&str],
    next: &str,
) {
    let mut mock = Mock::given(method("GET"))
        .and(path("/api/conversations.history"))
        .and(query_param("channel", channel));
    if let Some(cursor) = cursor {
        mock = mock.and(query_param("cursor", cursor));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_string(history_body(users, next)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_two_channels() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(channels_body(&[("A", "u1"), ("B", "u2")], "")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_user(&mock_server, "u1", "User One").await;
    mount_user(&mock_server, "u2", "User Two").await;

    // Cursor-specific mocks first: wiremock matches in mount order
    mount_history(&mock_server, "A", Some("a2"), &["u2"], "").await;
    mount_history(&mock_server, "A", None, &["u1", "u1"], "a2").await;
    mount_history(&mock_server, "B", None, &["u1"], "").await;

    let summaries = Arc::new(ChannelSummaries::new());
    let progress = Arc::new(CrawlProgress::new());
    let config = create_test_config(&mock_server.uri());

    let stats = run_crawl(&config, Arc::clone(&summaries), Arc::clone(&progress))
        .await
        .expect("Crawl failed");

    let count = |channel: &str, member: &str| {
        summaries
            .get(&ChannelMember::new(channel, member))
            .map(|info| info.message_count)
    };
    assert_eq!(count("A", "u1"), Some(2));
    assert_eq!(count("A", "u2"), Some(1));
    assert_eq!(count("B", "u1"), Some(1));
    assert_eq!(summaries.len(), 3);

    assert_eq!(stats.channels, 2);
    assert_eq!(stats.history_pages, 3);
    assert_eq!(progress.phase(), CrawlPhase::Complete);

    // Wiremock verifies the `expect` counts when mock_server drops
}

#[tokio::test]
async fn test_channel_list_error_stops_crawl() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .and(query_param("cursor", "page2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Page 3 must never be requested
    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .and(query_param("cursor", "page3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(channels_body(&[("C", "")], "")),
        )
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(channels_body(&[("A", "")], "page2")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.history"))
        .respond_with(ResponseTemplate::new(200).set_body_string(history_body(&["u1"], "")))
        .mount(&mock_server)
        .await;

    let summaries = Arc::new(ChannelSummaries::new());
    let progress = Arc::new(CrawlProgress::new());
    let config = create_test_config(&mock_server.uri());

    let result = run_crawl(&config, Arc::clone(&summaries), Arc::clone(&progress)).await;

    assert!(
        matches!(result, Err(ScrapeError::Status { status: 500, .. })),
        "unexpected result: {:?}",
        result
    );
    assert_eq!(progress.phase(), CrawlPhase::Failed);
    assert!(summaries
        .get(&ChannelMember::new("C", "u1"))
        .is_none());
}

#[tokio::test]
async fn test_creator_lookup_failure_still_merges_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(channels_body(&[("A", "ghost")], "")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users.info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"ok": false, "error": "user_not_found"}"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_history(&mock_server, "A", None, &["u1", "u3"], "").await;

    let summaries = Arc::new(ChannelSummaries::new());
    let config = create_test_config(&mock_server.uri());

    let stats = run_crawl(&config, Arc::clone(&summaries), Arc::new(CrawlProgress::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.creator_lookup_failures, 1);
    assert_eq!(summaries.len(), 2);
    assert_eq!(
        summaries
            .get(&ChannelMember::new("A", "u3"))
            .map(|info| info.message_count),
        Some(1)
    );
}

#[tokio::test]
async fn test_history_api_error_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(channels_body(&[("A", "")], "")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/conversations.history"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"ok": false, "error": "not_in_channel"}"#),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let result = run_crawl(
        &config,
        Arc::new(ChannelSummaries::new()),
        Arc::new(CrawlProgress::new()),
    )
    .await;

    match result {
        Err(ScrapeError::Api { method, error }) => {
            assert_eq!(method, "conversations.history");
            assert_eq!(error, "not_in_channel");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}
