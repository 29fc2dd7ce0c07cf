//! The weekly report run
//!
//! Fetch both feeds, rank the window, compare against the previous ranking,
//! post the message, then record this ranking for the next run.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::analytics::{
    analyze_window, collect_values, rank_movement, select_top_n, EntityFilter, RankedEntry, Window,
};
use crate::config::{AnalysisMode, Config, PreviousRankingSource};
use crate::error::{Error, Result};
use crate::feeds::FeedClient;
use crate::models::{DownloadHistory, ModDatabase, Release};
use crate::notifications::{build_channel, DeliveryStatus};
use crate::report::{LeaderboardRow, ReportBuilder, ReportData, ReportMessage};
use crate::storage::{Snapshot, SnapshotStore};
use crate::utils::error::PayloadError;

/// Per-run overrides, usually from the command line
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Render but neither send nor write the snapshot
    pub dry_run: bool,
    /// Reference instant; the current time when absent
    pub now: Option<DateTime<Utc>>,
    pub webhook_url: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub mode: Option<AnalysisMode>,
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub message: ReportMessage,
    pub ranking: Vec<RankedEntry>,
    /// `None` on a dry run
    pub delivery: Option<DeliveryStatus>,
    pub snapshot_written: bool,
}

/// Feed documents a report is computed from
#[derive(Debug, Clone)]
pub struct FeedData {
    /// Only fetched in history mode
    pub history: Option<DownloadHistory>,
    pub database: ModDatabase,
}

/// Run the report end to end
///
/// # Errors
///
/// Fails without sending when a feed cannot be fetched or decoded, and
/// without touching the snapshot when delivery fails.
pub async fn run_report(config: &Config, options: ReportOptions) -> Result<ReportOutcome> {
    let mode = options.mode.unwrap_or(config.analysis.mode);
    if mode == AnalysisMode::Database
        && config.analysis.previous_source == PreviousRankingSource::PriorWindow
    {
        return Err(Error::config(
            "a prior-window comparison needs the download history; use --mode history",
        ));
    }
    let now = options.now.unwrap_or_else(Utc::now);

    // Resolve the target before any fetching so a bad configuration fails fast.
    let channel = if options.dry_run {
        None
    } else {
        Some(build_channel(&config.delivery, options.webhook_url.as_deref())?)
    };

    let store = SnapshotStore::new(
        options
            .snapshot_path
            .clone()
            .unwrap_or_else(|| config.snapshot.path.clone()),
    );
    let previous = store.load()?;

    let client = FeedClient::new(&config.feeds)?;
    let history = match mode {
        AnalysisMode::History => Some(client.download_history().await?),
        AnalysisMode::Database => None,
    };
    let database = client.mod_database().await?;
    let feeds = FeedData { history, database };

    let data = compute_report(config, mode, &feeds, previous.as_ref(), now)?;
    let message = ReportBuilder::new(&config.report).build(&data);
    let ranking: Vec<RankedEntry> = data.rows.iter().map(|row| row.entry.clone()).collect();

    let Some(channel) = channel else {
        tracing::info!(
            entries = ranking.len(),
            "Dry run: report not sent, snapshot left untouched"
        );
        return Ok(ReportOutcome {
            message,
            ranking,
            delivery: None,
            snapshot_written: false,
        });
    };

    tracing::info!(
        channel = channel.name(),
        settings = %channel.config(),
        entries = ranking.len(),
        "Sending report"
    );
    let status = channel.send(&message).await?;

    let snapshot = Snapshot::new(
        ranking.iter().map(|entry| entry.key.clone()).collect(),
        Some(data.total_entities),
    );
    store.save(&snapshot)?;
    tracing::info!(path = %store.path().display(), "Snapshot updated");

    Ok(ReportOutcome {
        message,
        ranking,
        delivery: Some(status),
        snapshot_written: true,
    })
}

/// Compute the leaderboard and statistics from already fetched feeds
///
/// # Errors
///
/// Returns [`Error::NoData`] for a history-mode run without history,
/// and analysis errors such as duplicate keys.
pub fn compute_report(
    config: &Config,
    mode: AnalysisMode,
    feeds: &FeedData,
    previous: Option<&Snapshot>,
    now: DateTime<Utc>,
) -> Result<ReportData> {
    let window = Window::trailing_days(now, config.analysis.window_days)?;
    let options = config.analysis.delta_options();
    let filter = EntityFilter::new(
        &config.ranking.excluded_keys,
        &config.ranking.non_rankable_tags,
    );
    let index = feeds.database.index();
    let lookup = |key: &str| index.get(key).copied();
    let top_n = config.analysis.top_n;

    let (values, new_entities, history_series) = match mode {
        AnalysisMode::History => {
            let history = feeds.history.as_ref().ok_or(PayloadError::Empty {
                feed: "download history",
            })?;
            let series = history.series();
            let analysis = analyze_window(&series, &window, &options)?;
            (analysis.deltas, analysis.new_entities, Some(series))
        }
        AnalysisMode::Database => (
            collect_values(feeds.database.weekly_installs())?,
            feeds.database.new_mod_count(&window),
            None,
        ),
    };

    let top = select_top_n(&values, &filter, lookup, top_n);

    let previous_keys: Option<Vec<String>> = match (
        config.analysis.previous_source,
        &history_series,
    ) {
        (PreviousRankingSource::PriorWindow, Some(series)) => {
            let prior = analyze_window(series, &window.preceding()?, &options)?;
            Some(
                select_top_n(&prior.deltas, &filter, lookup, top_n)
                    .into_iter()
                    .map(|(key, _)| key)
                    .collect(),
            )
        }
        _ => previous.map(|snapshot| snapshot.previous_top_n.clone()),
    };

    let rows: Vec<LeaderboardRow> = rank_movement(&top, previous_keys.as_deref())
        .into_iter()
        .map(|entry| {
            let release = lookup(&entry.key);
            leaderboard_row(entry, release)
        })
        .collect();

    if rows.len() < top_n {
        tracing::warn!(
            eligible = rows.len(),
            requested = top_n,
            "Fewer eligible entities than leaderboard slots"
        );
    }

    Ok(ReportData {
        window,
        generated_at: now,
        mode,
        new_entities,
        total_entities: feeds.database.unique_mod_count(),
        previous_total: previous.and_then(|snapshot| snapshot.previous_total_count),
        rows,
        non_rankable_tags: config.ranking.non_rankable_tags.clone(),
    })
}

fn leaderboard_row(entry: RankedEntry, release: Option<&Release>) -> LeaderboardRow {
    let (name, slug) = release.map_or_else(
        || (entry.key.clone(), String::new()),
        |r| (r.name.clone(), r.slug.clone()),
    );
    LeaderboardRow { entry, name, slug }
}
