//! End-to-end report runs
//!
//! Tests the complete workflow:
//! 1. Feed fetch (mocked)
//! 2. Window analysis and ranking
//! 3. Message rendering and delivery (mocked)
//! 4. Snapshot update

use tempfile::TempDir;
use weekly_report::analytics::TrendIndicator;
use weekly_report::commands::{run_report, ReportOptions};
use weekly_report::config::{AnalysisMode, PreviousRankingSource};
use weekly_report::storage::{Snapshot, SnapshotStore};
use wiremock::MockServer;

use super::fixtures::{
    mount_feeds, mount_webhook, now, posted_bodies, request_count, test_config, ALPHA, BETA,
    DATABASE_PATH, DELTA, HISTORY_PATH, WEBHOOK_PATH,
};

fn options() -> ReportOptions {
    ReportOptions {
        now: Some(now()),
        ..Default::default()
    }
}

// ============================================================================
// Complete Run Tests
// ============================================================================

#[tokio::test]
async fn test_first_run_posts_and_writes_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let config = test_config(&mock_server, &snapshot_path);
    let outcome = run_report(&config, options()).await.unwrap();

    let keys: Vec<&str> = outcome.ranking.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec![ALPHA, BETA, DELTA]);
    assert!(outcome.delivery.is_some());
    assert!(outcome.snapshot_written);

    // Without a previous ranking every entry counts as improved
    assert!(outcome
        .ranking
        .iter()
        .all(|e| e.indicator() == TrendIndicator::Improved));

    let snapshot = SnapshotStore::new(&snapshot_path).load().unwrap().unwrap();
    assert_eq!(snapshot.previous_top_n, vec![ALPHA, BETA, DELTA]);
    assert_eq!(snapshot.previous_total_count, Some(5));
}

#[tokio::test]
async fn test_posted_payload_matches_ranking() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    run_report(&config, options()).await.unwrap();

    let bodies = posted_bodies(&mock_server, WEBHOOK_PATH).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];

    assert_eq!(
        body["content"],
        "Statistics from Sunday, March 3, 2024 to Sunday, March 10, 2024. (12:00 PM)"
    );
    assert_eq!(body["embeds"][0]["title"], "General Statistics");
    assert_eq!(
        body["embeds"][0]["description"],
        "<:newhere:1079777473585229875> New Mods : 1\n📋 Total Mods : 5"
    );

    let fields = body["embeds"][1]["fields"].as_array().unwrap();
    assert_eq!(body["embeds"][1]["title"], "Most Downloads");
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["name"], "<:green_up:1080545075005755543> :one: Alpha");
    assert_eq!(
        fields[0]["value"],
        "+200 downloads [Mod Page](https://outerwildsmods.com/mods/alpha/)"
    );
    assert_eq!(fields[1]["name"], "<:green_up:1080545075005755543> :two: Beta");
    assert_eq!(fields[2]["name"], "<:green_up:1080545075005755543> :three: Delta");
}

#[tokio::test]
async fn test_second_run_uses_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    SnapshotStore::new(&snapshot_path)
        .save(&Snapshot::new(
            vec![BETA.to_string(), ALPHA.to_string(), DELTA.to_string()],
            Some(4),
        ))
        .unwrap();

    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let config = test_config(&mock_server, &snapshot_path);
    let outcome = run_report(&config, options()).await.unwrap();

    let indicators: Vec<TrendIndicator> = outcome.ranking.iter().map(|e| e.indicator()).collect();
    assert_eq!(
        indicators,
        vec![
            TrendIndicator::Improved,
            TrendIndicator::Fell,
            TrendIndicator::Unchanged
        ]
    );

    let body = &posted_bodies(&mock_server, WEBHOOK_PATH).await[0];
    assert!(body["embeds"][0]["description"]
        .as_str()
        .unwrap()
        .ends_with("Total Mods : 5 (+1)"));
    assert!(body["embeds"][1]["fields"][2]["name"]
        .as_str()
        .unwrap()
        .starts_with("➖"));
}

#[tokio::test]
async fn test_dry_run_leaves_snapshot_alone() {
    let temp_dir = TempDir::new().unwrap();
    let snapshot_path = temp_dir.path().join("snapshot.json");
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 0).await;

    let mut config = test_config(&mock_server, &snapshot_path);
    // A dry run needs no delivery target
    config.delivery.webhook_url = None;

    let outcome = run_report(
        &config,
        ReportOptions {
            dry_run: true,
            ..options()
        },
    )
    .await
    .unwrap();

    assert!(outcome.delivery.is_none());
    assert!(!outcome.snapshot_written);
    assert_eq!(outcome.message.embeds.len(), 2);
    assert!(!snapshot_path.exists());
}

#[tokio::test]
async fn test_prior_window_comparison() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let mut config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    config.analysis.previous_source = PreviousRankingSource::PriorWindow;

    let outcome = run_report(&config, options()).await.unwrap();

    let previous: Vec<Option<usize>> = outcome.ranking.iter().map(|e| e.previous_rank).collect();
    assert_eq!(previous, vec![Some(1), Some(0), None]);
    assert_eq!(outcome.ranking[1].indicator(), TrendIndicator::Fell);
}

#[tokio::test]
async fn test_database_mode_ranks_weekly_installs() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    let outcome = run_report(
        &config,
        ReportOptions {
            mode: Some(AnalysisMode::Database),
            ..options()
        },
    )
    .await
    .unwrap();

    let keys: Vec<&str> = outcome.ranking.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![BETA, ALPHA, DELTA, "https://github.com/author/alpha-legacy"]
    );

    let body = &posted_bodies(&mock_server, WEBHOOK_PATH).await[0];
    assert_eq!(body["embeds"][1]["title"], "Most Installs");
    assert!(body["embeds"][0]["description"]
        .as_str()
        .unwrap()
        .contains("New Mods : 1"));

    // The history feed is not needed in this mode
    assert_eq!(request_count(&mock_server, HISTORY_PATH).await, 0);
    assert_eq!(request_count(&mock_server, DATABASE_PATH).await, 1);
}

#[tokio::test]
async fn test_webhook_argument_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    let mock_server = MockServer::start().await;
    mount_feeds(&mock_server).await;
    mount_webhook(&mock_server, 1).await;

    let mut config = test_config(&mock_server, &temp_dir.path().join("snapshot.json"));
    config.delivery.webhook_url = None;

    let outcome = run_report(
        &config,
        ReportOptions {
            webhook_url: Some(format!("{}{WEBHOOK_PATH}", mock_server.uri())),
            ..options()
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome.delivery.unwrap().channel, "webhook");
}
