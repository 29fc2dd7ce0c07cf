//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use chrono::{DateTime, Utc};

/// Convert a unix timestamp in seconds to a UTC instant
///
/// Returns `None` for values chrono cannot represent.
pub fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Format a change with an explicit sign: `+4`, `-1`, `±0`
pub fn format_signed(value: i64) -> String {
    match value {
        0 => String::from("±0"),
        v if v > 0 => format!("+{v}"),
        v => v.to_string(),
    }
}
