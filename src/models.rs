// Feed records for the download history and the mod database

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analytics::{Sample, Series, Tagged, Window};
use crate::utils::unix_to_datetime;

/// Placeholder rows in the download history carry this key
pub const IGNORED_ENTRY_KEY: &str = "IGNORE_ENTRY";

/// One download-count observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadCountUpdate {
    pub unix_timestamp: i64,
    pub download_count: u64,
}

/// Download history of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DownloadHistoryEntry {
    pub repo: String,
    #[serde(default)]
    pub updates: Option<Vec<DownloadCountUpdate>>,
}

impl DownloadHistoryEntry {
    /// Placeholder row or no updates at all
    pub fn is_skippable(&self) -> bool {
        self.repo == IGNORED_ENTRY_KEY || self.updates.as_ref().map_or(true, Vec::is_empty)
    }

    /// Convert to an analysis series; unrepresentable timestamps are dropped
    pub fn to_series(&self) -> Series {
        let samples = self
            .updates
            .iter()
            .flatten()
            .filter_map(|u| {
                unix_to_datetime(u.unix_timestamp).map(|ts| Sample::new(ts, u.download_count))
            })
            .collect();
        Series::new(self.repo.clone(), samples)
    }
}

/// The whole download-history feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadHistory(pub Vec<DownloadHistoryEntry>);

impl DownloadHistory {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Series for every usable entry
    pub fn series(&self) -> Vec<Series> {
        self.0
            .iter()
            .filter(|e| !e.is_skippable())
            .map(DownloadHistoryEntry::to_series)
            .collect()
    }
}

/// A mod listed in the database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    pub unique_name: String,
    pub repo: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub weekly_install_count: Option<u64>,
    #[serde(default, alias = "firstReleaseDate")]
    pub first_seen_at: Option<DateTime<Utc>>,
}

impl Tagged for Release {
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// The mod database feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDatabase {
    #[serde(default)]
    pub releases: Vec<Release>,
}

impl ModDatabase {
    /// First release listed for a repository
    pub fn find(&self, repo: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.repo == repo)
    }

    /// Repository → release index; the first listing of a repo wins
    pub fn index(&self) -> HashMap<&str, &Release> {
        self.releases.iter().rev().map(|r| (r.repo.as_str(), r)).collect()
    }

    /// Number of distinct mods by unique name
    pub fn unique_mod_count(&self) -> usize {
        self.releases
            .iter()
            .map(|r| r.unique_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Distinct mods first seen inside the window
    pub fn new_mod_count(&self, window: &Window) -> usize {
        self.releases
            .iter()
            .filter(|r| r.first_seen_at.is_some_and(|ts| window.contains(ts)))
            .map(|r| r.unique_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// `(repo, weekly installs)` for releases reporting the counter
    ///
    /// Counts beyond `i64::MAX` saturate.
    pub fn weekly_installs(&self) -> impl Iterator<Item = (&str, i64)> {
        self.releases.iter().filter_map(|r| {
            r.weekly_install_count
                .map(|c| (r.repo.as_str(), i64::try_from(c).unwrap_or(i64::MAX)))
        })
    }
}
