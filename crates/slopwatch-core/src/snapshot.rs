//! Ranked leaderboard of the current session.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::merge::{self, ScoredPhrase};
use crate::tracker::FrequencyTracker;

/// Records at or below this score are left out of a snapshot.
const MIN_SNAPSHOT_SCORE: f64 = 1.0;

/// Informational signals raised while building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotNotice {
    /// More records qualified than the cap allows.
    Truncated {
        /// Records that qualified.
        found: usize,
        /// Records kept after the cap.
        kept: usize,
    },
    /// Nothing qualified.
    Empty,
}

/// Merged patterns and leftover phrases, both ranked by descending score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSnapshot {
    /// Clustered patterns.
    pub merged: Vec<ScoredPhrase>,
    /// Phrases that joined no pattern.
    pub remaining: Vec<ScoredPhrase>,
    /// Truncation or empty-result notices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<SnapshotNotice>,
}

impl AnalysisSnapshot {
    /// Whether the snapshot has no patterns and no phrases.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty() && self.remaining.is_empty()
    }

    /// Patterns then phrases, limited to `n` entries in total.
    pub fn top(&self, n: usize) -> impl Iterator<Item = &ScoredPhrase> {
        self.merged.iter().chain(&self.remaining).take(n)
    }
}

/// Build a snapshot from the tracker's current records.
///
/// Keeps records scoring above 1, caps them at `cap` by score, merges their
/// surface forms and ranks the result.
#[tracing::instrument(skip(tracker), fields(records = tracker.len()))]
pub fn build_snapshot(
    tracker: &FrequencyTracker,
    cap: usize,
    min_common_words: usize,
) -> AnalysisSnapshot {
    let mut qualifying: Vec<(&str, f64)> = tracker
        .iter()
        .filter(|(_, record)| record.score > MIN_SNAPSHOT_SCORE)
        .map(|(_, record)| (record.original.as_str(), record.score))
        .collect();
    qualifying.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let mut notices = Vec::new();
    let found = qualifying.len();
    if found > cap {
        qualifying.truncate(cap);
        tracing::info!(found, kept = cap, "snapshot truncated to candidate cap");
        notices.push(SnapshotNotice::Truncated { found, kept: cap });
    }

    let mut by_surface: BTreeMap<String, f64> = BTreeMap::new();
    for (original, score) in qualifying {
        *by_surface.entry(original.to_string()).or_insert(0.0) += score;
    }

    let outcome = merge::merge_patterns(&by_surface, min_common_words);
    if outcome.merged.is_empty() && outcome.remaining.is_empty() {
        tracing::info!("no repetitive phrases found");
        notices.push(SnapshotNotice::Empty);
    }

    AnalysisSnapshot {
        merged: outcome.merged,
        remaining: outcome.remaining,
        notices,
    }
}
