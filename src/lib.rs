//! weekly-report - Weekly mod download statistics
//!
//! Fetches a community mod download history and the mod database, ranks the
//! mods that gained the most downloads over the last week and posts the
//! leaderboard to a chat channel.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`analytics`] - Outlier-filtered window deltas, eligibility and rank movement
//! - [`config`] - Configuration management and settings
//! - [`feeds`] - HTTP fetching of the two upstream feeds with bounded retry
//! - [`models`] - Feed records
//! - [`report`] - Rendering of the chat message
//! - [`notifications`] - Delivery through a webhook or a bot account
//! - [`storage`] - Snapshot of the previous ranking
//! - [`commands`] - The report run and the offline analysis
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use weekly_report::commands::{run_report, ReportOptions};
//! use weekly_report::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let options = ReportOptions {
//!         dry_run: true,
//!         ..Default::default()
//!     };
//!     let outcome = run_report(&config, options).await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome.message)?);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod feeds;
pub mod models;
pub mod notifications;
pub mod report;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{RankedEntry, Series, TrendIndicator, Window};
    pub use crate::commands::{run_report, ReportOptions, ReportOutcome};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, ReportErrorTrait, Result};
    pub use crate::models::{DownloadHistory, ModDatabase, Release};
    pub use crate::notifications::Channel;
    pub use crate::report::ReportMessage;
}

// Direct re-exports for convenience
pub use models::{DownloadHistory, ModDatabase, Release};
