use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::analytics::{analyze_window, Window, WindowAnalysis};
use crate::config::Config;
use crate::feeds::{parse_download_history, FeedClient};
use crate::models::DownloadHistory;

/// Deltas of one window, largest first
#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub window: Window,
    pub new_entities: usize,
    pub deltas: Vec<(String, i64)>,
}

impl AnalysisSummary {
    pub fn from_analysis(window: Window, analysis: WindowAnalysis) -> Self {
        let mut deltas: Vec<(String, i64)> = analysis.deltas.into_iter().collect();
        deltas.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            window,
            new_entities: analysis.new_entities,
            deltas,
        }
    }
}

/// Analyse a download history without ranking filters or delivery
pub fn summarize(
    config: &Config,
    history: &DownloadHistory,
    days: i64,
    now: DateTime<Utc>,
) -> Result<AnalysisSummary> {
    let window = Window::trailing_days(now, days)?;
    let analysis = analyze_window(&history.series(), &window, &config.analysis.delta_options())?;
    Ok(AnalysisSummary::from_analysis(window, analysis))
}

/// Print the deltas of a local or freshly fetched history
pub async fn analyze(
    config: &Config,
    history_file: Option<&Path>,
    days: Option<i64>,
) -> Result<()> {
    let history = match history_file {
        Some(path) => {
            let body = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read history file: {}", path.display()))?;
            parse_download_history(&body)
                .with_context(|| format!("Failed to decode history file: {}", path.display()))?
        }
        None => FeedClient::new(&config.feeds)?.download_history().await?,
    };

    let days = days.unwrap_or(config.analysis.window_days);
    let summary = summarize(config, &history, days, Utc::now())?;

    println!(
        "Window: {} .. {}",
        summary.window.from().format("%Y-%m-%d %H:%M"),
        summary.window.to().format("%Y-%m-%d %H:%M")
    );
    println!("New entities: {}", summary.new_entities);
    println!("========================");
    for (key, delta) in &summary.deltas {
        println!("{delta:>10}  {key}");
    }

    Ok(())
}
