//! Quartile estimation and IQR-based outlier fences
//!
//! Quartiles use the `(n + 1)` position rule: for quartile `q` of `n` values
//! sorted ascending, position `p = q * (n + 1) / 4`, `k = floor(p)` and
//! `alpha = p - k`, giving `v[k-1] + alpha * (v[k] - v[k-1])`.

use serde::{Deserialize, Serialize};

use super::Sample;

/// Multiplier applied to the IQR when placing the fences
pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;

/// Below this many samples no filtering is applied
pub const MIN_SAMPLES_FOR_FILTERING: usize = 4;

/// How the quartile position is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuartileMethod {
    /// Position computed in integer arithmetic, so `alpha` is always zero
    /// and the quartile is a sample value.
    #[default]
    Truncated,

    /// Position computed as a real number with linear interpolation
    Interpolated,
}

/// Estimate quartile `which` (1 or 3) of values sorted ascending
///
/// `k` is clamped to `[1, n - 1]` so small inputs never index out of
/// bounds. Returns `None` for an empty slice.
#[must_use]
pub fn quartile(sorted: &[u64], which: u32, method: QuartileMethod) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => return None,
        1 => return Some(sorted[0] as f64),
        _ => {}
    }

    let position = match method {
        QuartileMethod::Truncated => ((which as usize * (n + 1)) / 4) as f64,
        QuartileMethod::Interpolated => f64::from(which) * (n + 1) as f64 / 4.0,
    };

    let raw = position.floor() as usize;
    let (k, alpha) = if raw < 1 {
        (1, 0.0)
    } else if raw >= n {
        (n - 1, 1.0)
    } else {
        (raw, position - raw as f64)
    };

    let lower = sorted[k - 1] as f64;
    let upper = sorted[k] as f64;
    Some(lower + alpha * (upper - lower))
}

/// Inclusive acceptance range derived from the interquartile range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    /// Compute fences from values sorted ascending
    #[must_use]
    pub fn from_sorted(sorted: &[u64], method: QuartileMethod) -> Option<Self> {
        let q1 = quartile(sorted, 1, method)?;
        let q3 = quartile(sorted, 3, method)?;
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - IQR_FENCE_MULTIPLIER * iqr,
            upper: q3 + IQR_FENCE_MULTIPLIER * iqr,
        })
    }

    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Values strictly outside the fences are outliers
    #[must_use]
    pub fn contains(&self, value: u64) -> bool {
        let value = value as f64;
        value >= self.lower && value <= self.upper
    }
}

/// Drop outlying samples, keeping the input order
///
/// Sets smaller than [`MIN_SAMPLES_FOR_FILTERING`] are returned untouched.
/// If the fences would reject every sample the input is returned as-is, so
/// callers always have endpoints to work with.
#[must_use]
pub fn reject_outliers(samples: Vec<Sample>, method: QuartileMethod) -> Vec<Sample> {
    if samples.len() < MIN_SAMPLES_FOR_FILTERING {
        return samples;
    }

    let mut values: Vec<u64> = samples.iter().map(|s| s.value).collect();
    values.sort_unstable();

    let Some(fences) = Fences::from_sorted(&values, method) else {
        return samples;
    };

    let kept: Vec<Sample> = samples
        .iter()
        .copied()
        .filter(|s| fences.contains(s.value))
        .collect();

    if kept.is_empty() {
        tracing::debug!(
            lower = fences.lower,
            upper = fences.upper,
            "Outlier fences rejected every sample; keeping the unfiltered set"
        );
        return samples;
    }

    if kept.len() < samples.len() {
        tracing::trace!(
            dropped = samples.len() - kept.len(),
            lower = fences.lower,
            upper = fences.upper,
            "Dropped outlying samples"
        );
    }

    kept
}
