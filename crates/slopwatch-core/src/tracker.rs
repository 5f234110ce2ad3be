//! Scored frequency table.
//!
//! Every qualifying n-gram occurrence adds an increment to its record. The
//! increment favors longer phrases, phrases with more distinctive words,
//! blacklisted words and narration. Records that go quiet are decayed or
//! dropped by pruning.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::Serialize;

use crate::config::DetectionConfig;
use crate::lexicon::Lexicon;
use crate::ngrams::Ngram;
use crate::text::SegmentKind;

/// Extra score per word beyond the minimum window length.
const LENGTH_BONUS: f64 = 0.2;
/// Extra score per word outside the effective whitelist.
const UNCOMMON_WORD_BONUS: f64 = 0.5;
/// Multiplier for occurrences in narration.
const NARRATION_MULTIPLIER: f64 = 1.25;
/// Multiplier applied to stale records at or above the threshold.
const DECAY_FACTOR: f64 = 0.9;
/// Aggressive prune drops records below this score...
const AGGRESSIVE_MIN_SCORE: f64 = 2.0;
/// ...that have also been seen fewer than this many times.
const AGGRESSIVE_MIN_COUNT: u32 = 2;

/// Tracked state for one normalized phrase.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct NgramRecord {
    /// Most recently seen surface form.
    pub original: String,
    /// Occurrences seen.
    pub count: u32,
    /// Accumulated repetition score.
    pub score: f64,
    /// Index of the most recent message that contained the phrase.
    pub last_seen: u64,
}

/// Result of recording one occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    /// Normalized key of the record.
    pub key: String,
    /// Score after this occurrence.
    pub score: f64,
    /// Whether this occurrence carried the score across the threshold.
    pub promoted: bool,
}

/// What a prune pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PruneStats {
    /// Keys of deleted records.
    pub removed: Vec<String>,
    /// Number of records whose score was decayed.
    pub decayed: usize,
}

impl PruneStats {
    /// Whether the pass changed nothing.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.decayed == 0
    }
}

/// Owns the frequency table for one session.
#[derive(Debug, Clone)]
pub struct FrequencyTracker {
    records: HashMap<String, NgramRecord>,
    min_n: usize,
    threshold: f64,
    stale_window: u64,
}

impl FrequencyTracker {
    /// Create an empty tracker with the given detection settings.
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            records: HashMap::new(),
            min_n: config.min_n,
            threshold: config.threshold,
            stale_window: config.stale_window,
        }
    }

    /// The promotion threshold.
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score added by one occurrence of `original` (an `n`-word phrase).
    pub fn increment(&self, original: &str, n: usize, kind: SegmentKind, lexicon: &Lexicon) -> f64 {
        let extra_words = n.saturating_sub(self.min_n) as f64;
        let uncommon = lexicon.uncommon_word_count(original) as f64;
        let base = 1.0
            + extra_words * LENGTH_BONUS
            + uncommon * UNCOMMON_WORD_BONUS
            + f64::from(lexicon.blacklist_weight(original));
        match kind {
            SegmentKind::Narration => base * NARRATION_MULTIPLIER,
            SegmentKind::Dialogue => base,
        }
    }

    /// Record one occurrence of an n-gram seen in message `index`.
    ///
    /// Promotion is edge-triggered: only the occurrence that moves the score
    /// from below the threshold to at or above it reports `promoted`.
    pub fn observe(
        &mut self,
        ngram: &Ngram,
        kind: SegmentKind,
        index: u64,
        lexicon: &Lexicon,
    ) -> ScoreEvent {
        let increment = self.increment(&ngram.original, ngram.n, kind, lexicon);
        let record = self
            .records
            .entry(ngram.normalized.clone())
            .or_insert_with(|| NgramRecord {
                original: ngram.original.clone(),
                count: 0,
                score: 0.0,
                last_seen: index,
            });

        let old = record.score;
        record.score += increment;
        record.count += 1;
        record.last_seen = index;
        record.original.clone_from(&ngram.original);

        let promoted = old < self.threshold && record.score >= self.threshold;
        if promoted {
            tracing::debug!(
                key = %ngram.normalized,
                score = record.score,
                count = record.count,
                "phrase crossed threshold"
            );
        }

        ScoreEvent {
            key: ngram.normalized.clone(),
            score: record.score,
            promoted,
        }
    }

    /// Routine prune at message `current_index`.
    ///
    /// Stale records below the threshold are deleted; stale records at or
    /// above it decay. A record is stale when more than `stale_window`
    /// messages have passed since it was last seen.
    #[tracing::instrument(skip(self), fields(records = self.records.len()))]
    pub fn prune(&mut self, current_index: u64) -> PruneStats {
        let mut stats = PruneStats::default();
        let threshold = self.threshold;
        let stale_window = self.stale_window;

        self.records.retain(|key, record| {
            if current_index.saturating_sub(record.last_seen) <= stale_window {
                return true;
            }
            if record.score < threshold {
                stats.removed.push(key.clone());
                false
            } else {
                record.score *= DECAY_FACTOR;
                stats.decayed += 1;
                true
            }
        });
        stats.removed.sort_unstable();

        if !stats.is_empty() {
            tracing::debug!(
                removed = stats.removed.len(),
                decayed = stats.decayed,
                "pruned stale records"
            );
        }
        stats
    }

    /// Delete low-value one-off records regardless of age.
    #[tracing::instrument(skip(self), fields(records = self.records.len()))]
    pub fn prune_aggressive(&mut self) -> PruneStats {
        let mut stats = PruneStats::default();
        self.records.retain(|key, record| {
            let keep = record.score >= AGGRESSIVE_MIN_SCORE || record.count >= AGGRESSIVE_MIN_COUNT;
            if !keep {
                stats.removed.push(key.clone());
            }
            keep
        });
        stats.removed.sort_unstable();
        tracing::debug!(removed = stats.removed.len(), "aggressive prune");
        stats
    }

    /// Zero a record's score, returning whether the record exists.
    pub fn reset_score(&mut self, key: &str) -> bool {
        match self.records.get_mut(key) {
            Some(record) => {
                record.score = 0.0;
                true
            }
            None => false,
        }
    }

    /// Look up a record by normalized key.
    pub fn get(&self, key: &str) -> Option<&NgramRecord> {
        self.records.get(key)
    }

    /// Find the key of a record by its surface form.
    pub fn key_for_original(&self, original: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|(_, record)| record.original == original)
            .map(|(key, _)| key.as_str())
    }

    /// Iterate over `(key, record)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NgramRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
