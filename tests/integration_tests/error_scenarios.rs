//! Error scenario integration tests
//!
//! Tests the failure modes of a run:
//! 1. Feeds that keep failing
//! 2. Empty and malformed feeds
//! 3. Delivery rejected or unavailable
//! 4. Corrupt snapshot
//!
//! In every case nothing is posted after a feed failure and the snapshot
//! is left as it was.

use tempfile::TempDir;
use weekly_report::commands::{run_report, ReportOptions};
use weekly_report::error::{ChannelError, Error, ErrorCategory, FetchError, ReportErrorTrait};
use weekly_report::storage::{Snapshot, SnapshotStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{
    database_json, mount_feeds, mount_webhook, now, request_count, test_config, DATABASE_PATH,
    HISTORY_PATH, WEBHOOK_PATH,
};

fn options() -> ReportOptions {
    ReportOptions {
        now: Some(now()),
        ..Default::default()
    }
}

// ============================================================================
// Feed Error Tests
// ============================================================================

#[tokio::test]
async fn test_history_unavailable_after_five_attempts() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&mock_server)
        .await;
    mount_webhook(&mock_server, 0).await;

    let config = test_config(&mock_server, &snapshot_path);
    let err = run_report(&config, options()).await.unwrap_err();

    match &err {
        Error::FetchFailed(FetchError::Exhausted { attempts, .. }) => assert_eq!(*attempts, 5),
        other => panic!("Expected exhausted fetch, got: {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Network);
    assert_eq!(request_count(&mock_server, DATABASE_PATH).await, 0);
    assert!(!snapshot_path.exists());
}

#[tokio::test]
async fn test_database_not_found_fails_fast() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"Repo":"r","Updates":[]}]"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATABASE_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_webhook(&mock_server, 0).await;

    let config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(err, Error::FetchFailed(FetchError::ClientError(404))));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_empty_history_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATABASE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(database_json()))
        .mount(&mock_server)
        .await;
    mount_webhook(&mock_server, 0).await;

    let config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(err, Error::NoData(_)));
    assert_eq!(err.category(), ErrorCategory::Parsing);
}

#[tokio::test]
async fn test_malformed_database_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(HISTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(super::fixtures::history_json()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATABASE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;
    mount_webhook(&mock_server, 0).await;

    let config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(err, Error::NoData(_)));
}

// ============================================================================
// Delivery Error Tests
// ============================================================================

fn seeded_snapshot(temp_dir: &TempDir) -> (std::path::PathBuf, Snapshot) {
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let snapshot = Snapshot::new(vec!["https://github.com/author/beta".to_string()], Some(3));
    SnapshotStore::new(&snapshot_path).save(&snapshot).unwrap();
    (snapshot_path, snapshot)
}

#[tokio::test]
async fn test_rejected_delivery_keeps_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let (snapshot_path, before) = seeded_snapshot(&temp_dir);
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("{\"message\":\"Invalid Form Body\"}"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server, &snapshot_path);
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Delivery(ChannelError::Rejected { status: 400, .. })
    ));
    assert_eq!(err.category(), ErrorCategory::Delivery);

    let after = SnapshotStore::new(&snapshot_path).load().unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_unavailable_delivery_retried_then_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let (snapshot_path, before) = seeded_snapshot(&temp_dir);
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(5)
        .mount(&mock_server)
        .await;

    let config = test_config(&mock_server, &snapshot_path);
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Delivery(ChannelError::Exhausted { attempts: 5, .. })
    ));
    let after = SnapshotStore::new(&snapshot_path).load().unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_delivery_recovers_after_rate_limit() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_webhook(&mock_server, 1).await;

    let config = test_config(&mock_server, &snapshot_path);
    let outcome = run_report(&config, options()).await.unwrap();

    assert_eq!(outcome.delivery.unwrap().attempts, 3);
    assert!(snapshot_path.exists());
}

#[tokio::test]
async fn test_missing_delivery_target_fails_before_fetching() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;

    let mut config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    config.delivery.webhook_url = None;

    let err = run_report(&config, options()).await.unwrap_err();
    assert!(matches!(err, Error::Delivery(ChannelError::InvalidConfig(_))));
    assert_eq!(err.category(), ErrorCategory::Config);
    assert_eq!(request_count(&mock_server, HISTORY_PATH).await, 0);
}

// ============================================================================
// Snapshot Error Tests
// ============================================================================

#[tokio::test]
async fn test_corrupt_snapshot_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    std::fs::write(&snapshot_path, "{ not json").unwrap();

    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 0).await;

    let config = test_config(&mock_server, &snapshot_path);
    let err = run_report(&config, options()).await.unwrap_err();

    assert!(matches!(err, Error::Snapshot(_)));
    assert_eq!(err.category(), ErrorCategory::Storage);
}
