//! Report rendering
//!
//! Turns the ranked leaderboard and the general statistics into a chat
//! message made of two embeds, serialized as the webhook JSON body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{RankedEntry, TrendIndicator, Window};
use crate::config::{AnalysisMode, ReportConfig};
use crate::utils::{format_signed, truncate_text};

/// Platform limit on an embed field name
pub const FIELD_NAME_LIMIT: usize = 256;
/// Platform limit on an embed field value
pub const FIELD_VALUE_LIMIT: usize = 1024;

const RANK_EMOJI: [&str; 10] = [
    ":one:",
    ":two:",
    ":three:",
    ":four:",
    ":five:",
    ":six:",
    ":seven:",
    ":eight:",
    ":nine:",
    ":keycap_ten:",
];

/// A chat message with embeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    /// Create a field, truncating name and value to the platform limits
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: truncate_text(name, FIELD_NAME_LIMIT),
            value: truncate_text(value, FIELD_VALUE_LIMIT),
            inline: false,
        }
    }
}

/// A leaderboard row with the display metadata resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub entry: RankedEntry,
    pub name: String,
    pub slug: String,
}

/// Everything a report shows
#[derive(Debug, Clone)]
pub struct ReportData {
    pub window: Window,
    pub generated_at: DateTime<Utc>,
    pub mode: AnalysisMode,
    pub new_entities: usize,
    pub total_entities: usize,
    /// Total count stored by the previous run
    pub previous_total: Option<usize>,
    pub rows: Vec<LeaderboardRow>,
    pub non_rankable_tags: Vec<String>,
}

/// Emoji for a zero-based rank; past the tenth place `#11`, `#12`, ...
pub fn rank_emoji(rank: usize) -> String {
    RANK_EMOJI
        .get(rank)
        .map_or_else(|| format!("#{}", rank + 1), |emoji| (*emoji).to_string())
}

/// Renders [`ReportData`] with the configured wording
pub struct ReportBuilder<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Indicator text for a movement
    pub fn indicator(&self, indicator: TrendIndicator) -> &str {
        match indicator {
            TrendIndicator::Unchanged => &self.config.unchanged_indicator,
            TrendIndicator::Fell => &self.config.down_indicator,
            TrendIndicator::Improved => &self.config.up_indicator,
        }
    }

    pub fn build(&self, data: &ReportData) -> ReportMessage {
        ReportMessage {
            content: content_line(data.window, data.generated_at),
            embeds: vec![self.general_statistics(data), self.leaderboard(data)],
        }
    }

    fn general_statistics(&self, data: &ReportData) -> Embed {
        let mut total = format!(
            "{} Total Mods : {}",
            self.config.total_mods_emoji, data.total_entities
        );
        if let Some(previous) = data.previous_total {
            let change = data.total_entities as i64 - previous as i64;
            total.push_str(&format!(" ({})", format_signed(change)));
        }

        Embed {
            title: String::from("General Statistics"),
            description: Some(format!(
                "{} New Mods : {}\n{}",
                self.config.new_mods_emoji, data.new_entities, total
            )),
            color: self.config.embed_color,
            fields: Vec::new(),
        }
    }

    fn leaderboard(&self, data: &ReportData) -> Embed {
        let title = match data.mode {
            AnalysisMode::History => "Most Downloads",
            AnalysisMode::Database => "Most Installs",
        };

        Embed {
            title: title.to_string(),
            description: excluded_tags_note(&data.non_rankable_tags),
            color: self.config.embed_color,
            fields: data.rows.iter().map(|row| self.field(row, data.mode)).collect(),
        }
    }

    /// One leaderboard field: `{indicator} {rank} {name}` / `+{n} downloads [Mod Page](...)`
    pub fn field(&self, row: &LeaderboardRow, mode: AnalysisMode) -> EmbedField {
        let unit = match mode {
            AnalysisMode::History => "downloads",
            AnalysisMode::Database => "installs",
        };

        let name = format!(
            "{} {} {}",
            self.indicator(row.entry.indicator()),
            rank_emoji(row.entry.rank),
            row.name
        );
        let value = format!(
            "{:+} {} [Mod Page]({}/{}/)",
            row.entry.value,
            unit,
            self.config.mod_page_base_url.trim_end_matches('/'),
            row.slug
        );
        EmbedField::new(&name, &value)
    }
}

/// `Statistics from {from} to {to}. ({time})`
pub fn content_line(window: Window, generated_at: DateTime<Utc>) -> String {
    format!(
        "Statistics from {} to {}. ({})",
        window.from().format("%A, %B %-d, %Y"),
        window.to().format("%A, %B %-d, %Y"),
        generated_at.format("%-I:%M %p")
    )
}

fn excluded_tags_note(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let list = tags
        .iter()
        .map(|t| format!("`{t}`"))
        .collect::<Vec<_>>()
        .join(" or ");
    Some(format!("This ranking does not include any mod tagged with {list}."))
}
