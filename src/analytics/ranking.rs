//! Entity eligibility, top-N selection and rank movement

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::{AnalysisError, AnalysisResult};

/// Tag that keeps an entity out of the ranking by default
pub const DEFAULT_NON_RANKABLE_TAG: &str = "library";

/// Metadata carrying category tags
pub trait Tagged {
    fn tags(&self) -> &[String];
}

/// Why an entity may or may not take a rank slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    /// Key is in the configured exclusion set
    Excluded,
    /// No metadata is known for the key
    Unlisted,
    /// Tagged with a non-rankable category
    NonRankable(String),
}

impl Eligibility {
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Decides which entities may appear in the ranking
#[derive(Debug, Clone, Default)]
pub struct EntityFilter {
    excluded: HashSet<String>,
    non_rankable_tags: HashSet<String>,
}

impl EntityFilter {
    pub fn new<I, J, S, T>(excluded: I, non_rankable_tags: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
            non_rankable_tags: non_rankable_tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_excluded(mut self, key: impl Into<String>) -> Self {
        self.excluded.insert(key.into());
        self
    }

    pub fn with_non_rankable_tag(mut self, tag: impl Into<String>) -> Self {
        self.non_rankable_tags.insert(tag.into());
        self
    }

    /// Classify an entity given its key and metadata, if any
    pub fn eligibility<M: Tagged + ?Sized>(&self, key: &str, metadata: Option<&M>) -> Eligibility {
        if self.excluded.contains(key) {
            return Eligibility::Excluded;
        }

        let Some(metadata) = metadata else {
            return Eligibility::Unlisted;
        };

        match metadata
            .tags()
            .iter()
            .find(|tag| self.non_rankable_tags.contains(tag.as_str()))
        {
            Some(tag) => Eligibility::NonRankable(tag.clone()),
            None => Eligibility::Eligible,
        }
    }

    pub fn is_eligible<M: Tagged + ?Sized>(&self, key: &str, metadata: Option<&M>) -> bool {
        self.eligibility(key, metadata).is_eligible()
    }
}

/// Collect `(key, value)` pairs into a map, failing on repeated keys
pub fn collect_values<I, K>(pairs: I) -> AnalysisResult<BTreeMap<String, i64>>
where
    I: IntoIterator<Item = (K, i64)>,
    K: Into<String>,
{
    pairs
        .into_iter()
        .try_fold(BTreeMap::new(), |mut acc, (key, value)| {
            let key = key.into();
            if acc.contains_key(&key) {
                return Err(AnalysisError::DuplicateKey(key));
            }
            acc.insert(key, value);
            Ok(acc)
        })
}

/// Pick the `n` highest values among eligible entities
///
/// Ineligible entities are removed before taking `n`, so they never occupy
/// a slot. Ties are broken by key so the order is deterministic.
pub fn select_top_n<'a, M, F>(
    values: &BTreeMap<String, i64>,
    filter: &EntityFilter,
    lookup: F,
    n: usize,
) -> Vec<(String, i64)>
where
    M: Tagged + ?Sized + 'a,
    F: Fn(&str) -> Option<&'a M>,
{
    let mut eligible: Vec<(String, i64)> = values
        .iter()
        .filter(|(key, _)| {
            let eligibility = filter.eligibility(key, lookup(key));
            if !eligibility.is_eligible() {
                tracing::debug!(key = %key, reason = ?eligibility, "Entity left out of ranking");
            }
            eligibility.is_eligible()
        })
        .map(|(key, value)| (key.clone(), *value))
        .collect();

    eligible.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    eligible.truncate(n);
    eligible
}

/// Movement of an entry relative to the previous ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendIndicator {
    Unchanged,
    Fell,
    /// Moved up, or was not ranked before
    Improved,
}

impl TrendIndicator {
    /// Classify an entry at `rank` whose previous rank was `previous`
    #[must_use]
    pub fn classify(rank: usize, previous: Option<usize>) -> Self {
        // Only a strictly better previous rank counts as a fall. Everything
        // else that is not an exact match lands in Improved, including
        // previous > rank.
        match previous {
            Some(p) if p == rank => Self::Unchanged,
            Some(p) if p < rank => Self::Fell,
            _ => Self::Improved,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Fell => "fell",
            Self::Improved => "improved",
        }
    }
}

impl std::fmt::Display for TrendIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub key: String,
    pub value: i64,
    /// Zero-based position in the current ranking
    pub rank: usize,
    /// Zero-based position in the previous ranking, `None` when absent
    pub previous_rank: Option<usize>,
}

impl RankedEntry {
    /// Previous rank with `-1` standing for "absent"
    #[must_use]
    pub fn previous_rank_index(&self) -> i64 {
        self.previous_rank.map_or(-1, |p| p as i64)
    }

    #[must_use]
    pub fn indicator(&self) -> TrendIndicator {
        TrendIndicator::classify(self.rank, self.previous_rank)
    }
}

/// Attach previous ranks to the current ranking
///
/// With no previous ranking every entry is absent.
#[must_use]
pub fn rank_movement(current: &[(String, i64)], previous: Option<&[String]>) -> Vec<RankedEntry> {
    current
        .iter()
        .enumerate()
        .map(|(rank, (key, value))| RankedEntry {
            key: key.clone(),
            value: *value,
            rank,
            previous_rank: previous.and_then(|keys| keys.iter().position(|k| k == key)),
        })
        .collect()
}
