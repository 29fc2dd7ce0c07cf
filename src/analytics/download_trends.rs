//! Outlier-filtered counter change across a time window
//!
//! For every series the samples inside the window are ordered newest first,
//! outlying values are dropped (see [`super::outliers`]) and the change is
//! the newest surviving value minus the oldest surviving value.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::outliers::{reject_outliers, QuartileMethod};
use super::{AnalysisError, AnalysisResult, Sample, Series, Window};

/// Rule deciding whether an entity counts as new within a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewEntityPolicy {
    /// New when the series has no sample strictly before the window start
    #[default]
    NoPriorSamples,

    /// New when the earliest in-window sample is exactly zero and was taken
    /// on a different weekday than the window start
    ZeroStartOnDifferentWeekday,
}

impl NewEntityPolicy {
    /// `earliest` is the oldest sample inside the window
    fn is_new(self, series: &Series, earliest: &Sample, window: &Window) -> bool {
        match self {
            Self::NoPriorSamples => !series
                .samples
                .iter()
                .any(|s| s.timestamp < window.from()),
            Self::ZeroStartOnDifferentWeekday => {
                earliest.value == 0 && earliest.timestamp.weekday() != window.from().weekday()
            }
        }
    }
}

/// Knobs for [`window_delta`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaOptions {
    pub new_entity_policy: NewEntityPolicy,
    pub quartile_method: QuartileMethod,
}

/// Change of one entity across a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDelta {
    pub is_new: bool,
    pub delta: i64,
}

/// Compute the outlier-filtered change of a series across a window
///
/// Returns `None` when no sample falls inside the window.
#[must_use]
pub fn window_delta(
    series: &Series,
    window: &Window,
    options: &DeltaOptions,
) -> Option<WindowDelta> {
    let mut ordered: Vec<Sample> = series
        .samples
        .iter()
        .copied()
        .filter(|s| window.contains(s.timestamp))
        .collect();

    if ordered.is_empty() {
        return None;
    }

    // Newest first
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let earliest = ordered[ordered.len() - 1];
    let is_new = options
        .new_entity_policy
        .is_new(series, &earliest, window);

    let kept = reject_outliers(ordered, options.quartile_method);
    let (newest, oldest) = match (kept.first(), kept.last()) {
        (Some(newest), Some(oldest)) => (newest, oldest),
        _ => return None,
    };

    Some(WindowDelta {
        is_new,
        delta: signed_change(oldest.value, newest.value),
    })
}

/// `to - from`, saturating at the bounds of `i64`
fn signed_change(from: u64, to: u64) -> i64 {
    if to >= from {
        i64::try_from(to - from).unwrap_or(i64::MAX)
    } else {
        i64::try_from(from - to).map_or(i64::MIN, |fall| -fall)
    }
}

/// Result of analysing every series over one window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WindowAnalysis {
    /// Entities considered new within the window
    pub new_entities: usize,

    /// Change per entity key
    pub deltas: BTreeMap<String, i64>,
}

impl WindowAnalysis {
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    fn with(mut self, key: &str, delta: WindowDelta) -> AnalysisResult<Self> {
        if self.deltas.insert(key.to_string(), delta.delta).is_some() {
            return Err(AnalysisError::DuplicateKey(key.to_string()));
        }
        if delta.is_new {
            self.new_entities += 1;
        }
        Ok(self)
    }
}

/// Analyse a collection of series over one window
///
/// Series without samples in the window are left out. A key that appears
/// twice among the analysed series is a [`AnalysisError::DuplicateKey`].
pub fn analyze_window<'a, I>(
    series: I,
    window: &Window,
    options: &DeltaOptions,
) -> AnalysisResult<WindowAnalysis>
where
    I: IntoIterator<Item = &'a Series>,
{
    let analysis = series
        .into_iter()
        .filter_map(|s| window_delta(s, window, options).map(|d| (s.key.as_str(), d)))
        .try_fold(WindowAnalysis::default(), |acc, (key, delta)| {
            acc.with(key, delta)
        })?;

    tracing::debug!(
        entities = analysis.len(),
        new_entities = analysis.new_entities,
        from = %window.from(),
        to = %window.to(),
        "Window analysed"
    );

    Ok(analysis)
}
