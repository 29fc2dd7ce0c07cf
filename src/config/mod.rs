//! Configuration management for the weekly report
//!
//! Configuration is loaded from an optional TOML file, then overridden by
//! `REPORT_*` environment variables, then validated. Every section has
//! defaults, so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analytics::ranking::DEFAULT_NON_RANKABLE_TAG;
use crate::analytics::{DeltaOptions, NewEntityPolicy, QuartileMethod, MAX_WINDOW_DAYS};
use crate::utils::retry::{RetryConfig, DEFAULT_MAX_ATTEMPTS};

pub const DEFAULT_DOWNLOAD_HISTORY_URL: &str =
    "https://ow-mods.github.io/ow-mod-download-history/download-history.json";
pub const DEFAULT_DATABASE_URL: &str = "https://ow-mods.github.io/ow-mod-db/database.json";
pub const DEFAULT_BOT_API_BASE: &str = "https://discord.com/api/v10";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream feed locations and fetch policy
    pub feeds: FeedsConfig,

    /// Analysis mode and window
    pub analysis: AnalysisConfig,

    /// Which entities may be ranked
    pub ranking: RankingConfig,

    /// Previous-run snapshot location
    pub snapshot: SnapshotConfig,

    /// Where the report is posted
    pub delivery: DeliveryConfig,

    /// Message wording and emoji
    pub report: ReportConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Feed fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub download_history_url: String,
    pub database_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per feed before the run fails
    pub max_attempts: u32,

    /// Delay before the first retry; 0 retries immediately
    pub retry_delay_ms: u64,

    pub user_agent: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            download_history_url: DEFAULT_DOWNLOAD_HISTORY_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            request_timeout_secs: 30,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
            user_agent: format!("weekly-report/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FeedsConfig {
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_delays(self.max_attempts, self.retry_delay_ms, 30_000)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// What the leaderboard ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Outlier-filtered download change over the window
    #[default]
    History,
    /// Weekly install counter from the mod database
    Database,
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "history" => Ok(Self::History),
            "database" => Ok(Self::Database),
            other => Err(format!("unknown analysis mode: {other}")),
        }
    }
}

/// Where the previous ranking comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviousRankingSource {
    /// Persisted snapshot of the last run
    #[default]
    Snapshot,
    /// Recomputed from the history over the preceding window
    PriorWindow,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    pub window_days: i64,
    pub top_n: usize,
    pub new_entity_policy: NewEntityPolicy,
    pub quartile_method: QuartileMethod,
    pub previous_source: PreviousRankingSource,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::History,
            window_days: 7,
            top_n: 10,
            new_entity_policy: NewEntityPolicy::default(),
            quartile_method: QuartileMethod::default(),
            previous_source: PreviousRankingSource::default(),
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub fn delta_options(&self) -> DeltaOptions {
        DeltaOptions {
            new_entity_policy: self.new_entity_policy,
            quartile_method: self.quartile_method,
        }
    }
}

/// Ranking eligibility configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Keys never ranked
    pub excluded_keys: Vec<String>,

    /// Entities with any of these tags are never ranked
    pub non_rankable_tags: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            excluded_keys: vec![
                String::from("https://github.com/ow-mods/ow-mod-manager"),
                String::from("https://github.com/ow-mods/owml"),
                String::from("https://github.com/amazingalek/owml"),
            ],
            non_rankable_tags: vec![String::from(DEFAULT_NON_RANKABLE_TAG)],
        }
    }
}

/// Snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("snapshot.json"),
        }
    }
}

/// Delivery target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    #[default]
    Webhook,
    Bot,
}

/// Delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub kind: DeliveryKind,
    pub webhook_url: Option<String>,
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            kind: DeliveryKind::Webhook,
            webhook_url: None,
            bot_token: None,
            channel_id: None,
            api_base: DEFAULT_BOT_API_BASE.to_string(),
            timeout_secs: 10,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Report wording and emoji
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub embed_color: u32,
    pub up_indicator: String,
    pub down_indicator: String,
    pub unchanged_indicator: String,
    pub new_mods_emoji: String,
    pub total_mods_emoji: String,
    pub mod_page_base_url: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            // orange
            embed_color: 0xFFA500,
            up_indicator: String::from("<:green_up:1080545075005755543>"),
            down_indicator: String::from("<:red_down:1080545078197637240>"),
            unchanged_indicator: String::from("➖"),
            new_mods_emoji: String::from("<:newhere:1079777473585229875>"),
            total_mods_emoji: String::from("📋"),
            mod_page_base_url: String::from("https://outerwildsmods.com/mods"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override values from `REPORT_*` environment variables
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("REPORT_WEBHOOK_URL") {
            self.delivery.webhook_url = Some(url);
        }
        if let Ok(token) = std::env::var("REPORT_BOT_TOKEN") {
            self.delivery.bot_token = Some(token);
            self.delivery.kind = DeliveryKind::Bot;
        }
        if let Ok(channel) = std::env::var("REPORT_CHANNEL_ID") {
            self.delivery.channel_id = Some(channel);
        }
        if let Ok(path) = std::env::var("REPORT_SNAPSHOT_PATH") {
            self.snapshot.path = PathBuf::from(path);
        }
        if let Ok(url) = std::env::var("REPORT_DOWNLOAD_HISTORY_URL") {
            self.feeds.download_history_url = url;
        }
        if let Ok(url) = std::env::var("REPORT_DATABASE_URL") {
            self.feeds.database_url = url;
        }
        if let Ok(value) = std::env::var("REPORT_TOP_N") {
            self.analysis.top_n = value
                .parse()
                .with_context(|| format!("REPORT_TOP_N is not a number: {value}"))?;
        }
        if let Ok(value) = std::env::var("REPORT_WINDOW_DAYS") {
            self.analysis.window_days = value
                .parse()
                .with_context(|| format!("REPORT_WINDOW_DAYS is not a number: {value}"))?;
        }
        if let Ok(value) = std::env::var("REPORT_MODE") {
            self.analysis.mode = value.parse().map_err(anyhow::Error::msg)?;
        }
        if let Ok(level) = std::env::var("REPORT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("REPORT_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.analysis.top_n == 0 {
            anyhow::bail!("analysis.top_n must be greater than 0");
        }

        if !(1..=MAX_WINDOW_DAYS).contains(&self.analysis.window_days) {
            anyhow::bail!("analysis.window_days must be between 1 and {MAX_WINDOW_DAYS}");
        }

        if self.analysis.mode == AnalysisMode::Database
            && self.analysis.previous_source == PreviousRankingSource::PriorWindow
        {
            anyhow::bail!("analysis.previous_source = \"prior_window\" requires mode = \"history\"");
        }

        if self.feeds.max_attempts == 0 {
            anyhow::bail!("feeds.max_attempts must be greater than 0");
        }

        if self.feeds.request_timeout_secs == 0 {
            anyhow::bail!("feeds.request_timeout_secs must be greater than 0");
        }

        for (name, value) in [
            ("feeds.download_history_url", &self.feeds.download_history_url),
            ("feeds.database_url", &self.feeds.database_url),
        ] {
            url::Url::parse(value).with_context(|| format!("{name} is not a valid URL: {value}"))?;
        }

        if self.snapshot.path.as_os_str().is_empty() {
            anyhow::bail!("snapshot.path must be non-empty");
        }

        Ok(())
    }
}
