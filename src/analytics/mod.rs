//! Analytics for download trends and rankings
//!
//! - [`download_trends`] - outlier-filtered change of a counter across a window
//! - [`outliers`] - quartile estimation and IQR fences
//! - [`ranking`] - entity eligibility, top-N selection and rank movement

pub mod download_trends;
pub mod outliers;
pub mod ranking;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use download_trends::{
    analyze_window, window_delta, DeltaOptions, NewEntityPolicy, WindowAnalysis, WindowDelta,
};
pub use outliers::{quartile, reject_outliers, Fences, QuartileMethod};
pub use ranking::{
    collect_values, rank_movement, select_top_n, Eligibility, EntityFilter, RankedEntry, Tagged,
    TrendIndicator,
};

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Duplicate entity key: {0}")]
    DuplicateKey(String),

    #[error("Invalid time range: start {0} is after end {1}")]
    InvalidWindow(DateTime<Utc>, DateTime<Utc>),

    #[error("Invalid window length: {0} days")]
    InvalidWindowLength(i64),

    #[error("Window of {days} days ending at {end} starts before the earliest representable time")]
    WindowOutOfRange { end: DateTime<Utc>, days: i64 },
}

/// Longest window a report may cover
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// One observation of a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: u64,
}

impl Sample {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, value: u64) -> Self {
        Self { timestamp, value }
    }
}

/// Samples of one entity, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub key: String,
    pub samples: Vec<Sample>,
}

impl Series {
    #[must_use]
    pub fn new(key: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            key: key.into(),
            samples,
        }
    }

    /// Build a series from `(timestamp, value)` pairs
    pub fn from_points<I>(key: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (DateTime<Utc>, u64)>,
    {
        Self::new(
            key,
            points
                .into_iter()
                .map(|(timestamp, value)| Sample::new(timestamp, value))
                .collect(),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Closed interval `[from, to]` selecting the samples of one report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Window {
    /// Create a window, rejecting `from > to`
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> AnalysisResult<Self> {
        if from > to {
            return Err(AnalysisError::InvalidWindow(from, to));
        }
        Ok(Self { from, to })
    }

    /// The `days` days ending at `now`, for `days` in `1..=MAX_WINDOW_DAYS`
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> AnalysisResult<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(AnalysisError::InvalidWindowLength(days));
        }
        let from = Duration::try_days(days)
            .and_then(|length| now.checked_sub_signed(length))
            .ok_or(AnalysisError::WindowOutOfRange { end: now, days })?;
        Self::new(from, now)
    }

    /// Window of the same length ending where this one starts
    pub fn preceding(&self) -> AnalysisResult<Self> {
        let from = self
            .from
            .checked_sub_signed(self.length())
            .ok_or(AnalysisError::WindowOutOfRange {
                end: self.from,
                days: self.length().num_days(),
            })?;
        Ok(Self {
            from,
            to: self.from,
        })
    }

    #[must_use]
    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }

    #[must_use]
    pub fn length(&self) -> Duration {
        self.to - self.from
    }

    /// Inclusive on both ends
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.from <= timestamp && timestamp <= self.to
    }
}
