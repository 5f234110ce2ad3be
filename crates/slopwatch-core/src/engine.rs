//! Detection session.
//!
//! [`SlopEngine`] owns the frequency table, the candidate set, the lexicon
//! and the exclusion oracle for one session, and runs every message through
//! normalization, extraction, filtering and scoring.

use std::cmp::Ordering;
use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidates::CandidateSet;
use crate::config::{self, Config, DetectionConfig, HandoffConfig};
use crate::error::ConfigResult;
use crate::filter::{ExclusionOracle, NoExclusions, QualityFilter, RuleOracle};
use crate::lexicon::Lexicon;
use crate::ngrams;
use crate::snapshot::{self, AnalysisSnapshot};
use crate::text;
use crate::tracker::{FrequencyTracker, NgramRecord, PruneStats};

/// A candidate-set member as offered to a downstream consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Candidate {
    /// Normalized key.
    pub key: String,
    /// Most recent surface form, or the key when the record is gone.
    pub original: String,
    /// Current score.
    pub score: f64,
    /// Occurrences seen.
    pub count: u32,
}

/// Candidates offered for rule generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HandoffBatch {
    /// Highest-scoring candidates first.
    pub candidates: Vec<Candidate>,
}

/// What observing one message did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObserveOutcome {
    /// Keys inserted into the candidate set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub promoted: Vec<String>,
    /// Result of a scheduled routine prune.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned: Option<PruneStats>,
    /// Candidates due for hand-off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffBatch>,
}

/// One repetition-detection session.
pub struct SlopEngine {
    detection: DetectionConfig,
    handoff: HandoffConfig,
    lexicon: Lexicon,
    oracle: Box<dyn ExclusionOracle + Send>,
    tracker: FrequencyTracker,
    candidates: CandidateSet,
    observed: usize,
    pending_messages: usize,
}

impl std::fmt::Debug for SlopEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlopEngine")
            .field("detection", &self.detection)
            .field("records", &self.tracker.len())
            .field("candidates", &self.candidates.len())
            .field("observed", &self.observed)
            .finish_non_exhaustive()
    }
}

impl SlopEngine {
    /// Create an engine with the given detection settings, the built-in
    /// lexicon and no exclusions.
    pub fn new(detection: DetectionConfig) -> ConfigResult<Self> {
        detection.validate()?;
        let lexicon = Lexicon::from_config(&detection);
        Ok(Self {
            tracker: FrequencyTracker::new(&detection),
            detection,
            handoff: HandoffConfig::default(),
            lexicon,
            oracle: Box::new(NoExclusions),
            candidates: CandidateSet::new(),
            observed: 0,
            pending_messages: 0,
        })
    }

    /// Create an engine from a full configuration, including the rule
    /// oracle and hand-off settings.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let oracle = RuleOracle::from_config(&config.exclusions)?;
        let mut engine = Self::new(config.detection.clone())?;
        engine.handoff = config.handoff.clone();
        if !oracle.is_empty() {
            engine.oracle = Box::new(oracle);
        }
        Ok(engine)
    }

    /// Replace the exclusion oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: impl ExclusionOracle + Send + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Replace the hand-off settings.
    #[must_use]
    pub fn with_handoff(mut self, handoff: HandoffConfig) -> Self {
        self.handoff = handoff;
        self
    }

    /// Score every qualifying n-gram of one message.
    ///
    /// Returns the keys newly inserted into the candidate set that are still
    /// members once the whole message has been scored. Runs no
    /// maintenance; see [`SlopEngine::observe`].
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn ingest(&mut self, text: &str, index: u64) -> Vec<String> {
        let mut promoted = Vec::new();
        let filter = QualityFilter::new(self.detection.min_n, &self.lexicon, self.oracle.as_ref());

        for segment in text::normalize(text) {
            for ngram in ngrams::extract(
                &segment,
                self.detection.min_n,
                self.detection.max_n,
                &self.lexicon,
            ) {
                if !filter.accept(&ngram.original) {
                    continue;
                }
                let event = self
                    .tracker
                    .observe(&ngram, segment.kind(), index, &self.lexicon);
                if event.promoted && self.candidates.promote(&event.key) {
                    promoted.push(event.key);
                }
            }
        }

        // A longer promotion later in the message may have absorbed an earlier one.
        promoted.retain(|key| self.candidates.contains(key));
        if !promoted.is_empty() {
            tracing::debug!(count = promoted.len(), "new candidates");
        }
        promoted
    }

    /// Observe one message and run scheduled maintenance.
    ///
    /// Every `prune_interval` messages a routine prune runs. With hand-off
    /// enabled, messages observed while candidates are pending are counted
    /// (the count carries over periods with no candidates) and a batch is
    /// offered once the count reaches `trigger_after`. Empty text is a no-op.
    pub fn observe(&mut self, text: &str, index: u64) -> ObserveOutcome {
        if text.trim().is_empty() {
            return ObserveOutcome::default();
        }

        let promoted = self.ingest(text, index);
        self.observed += 1;

        let pruned = (self.observed % self.detection.prune_interval == 0).then(|| self.prune(index));

        let handoff = self.handoff.trigger_after.and_then(|after| {
            if self.candidates.is_empty() {
                return None;
            }
            self.pending_messages += 1;
            if self.pending_messages < after {
                return None;
            }
            self.pending_messages = 0;
            let batch = self.handoff_batch(self.handoff.batch_size);
            tracing::info!(candidates = batch.candidates.len(), "hand-off batch ready");
            Some(batch)
        });

        ObserveOutcome {
            promoted,
            pruned,
            handoff,
        }
    }

    /// Routine prune at message `index`; deleted records leave the candidate set.
    pub fn prune(&mut self, index: u64) -> PruneStats {
        let stats = self.tracker.prune(index);
        for key in &stats.removed {
            self.candidates.remove(key);
        }
        stats
    }

    /// Drop low-value one-off records regardless of age.
    pub fn prune_aggressive(&mut self) -> PruneStats {
        let stats = self.tracker.prune_aggressive();
        for key in &stats.removed {
            self.candidates.remove(key);
        }
        stats
    }

    /// Swap in new user word lists and recompute the effective whitelist.
    ///
    /// Blacklist weights outside 1 to 10 are rejected and leave the lexicon
    /// unchanged.
    pub fn refresh_lexicon<I, S>(
        &mut self,
        whitelist: I,
        blacklist: HashMap<String, u8>,
    ) -> ConfigResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config::validate_blacklist(&blacklist)?;
        self.lexicon.refresh(whitelist, blacklist);
        Ok(())
    }

    /// Retire a candidate after it has been handed off.
    ///
    /// Accepts either the normalized key or a surface form. The candidate is
    /// removed and its record's score zeroed. Returns whether anything
    /// matched.
    pub fn mark_processed(&mut self, phrase: &str) -> bool {
        let phrase = phrase.trim().to_lowercase();
        let key = if self.candidates.contains(&phrase) || self.tracker.get(&phrase).is_some() {
            phrase
        } else {
            match self.tracker.key_for_original(&phrase) {
                Some(key) => key.to_string(),
                None => return false,
            }
        };

        let removed = self.candidates.remove(&key);
        let reset = self.tracker.reset_score(&key);
        tracing::debug!(%key, removed, reset, "candidate processed");
        removed || reset
    }

    /// Current candidate-set members, in key order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.candidates
            .iter()
            .map(|key| self.candidate(key))
            .collect()
    }

    /// Up to `limit` candidates, highest score first.
    pub fn handoff_batch(&self, limit: usize) -> HandoffBatch {
        let mut candidates = self.candidates();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        candidates.truncate(limit);
        HandoffBatch { candidates }
    }

    fn candidate(&self, key: &str) -> Candidate {
        match self.tracker.get(key) {
            Some(record) => Candidate {
                key: key.to_string(),
                original: record.original.clone(),
                score: record.score,
                count: record.count,
            },
            None => Candidate {
                key: key.to_string(),
                original: key.to_string(),
                score: 0.0,
                count: 0,
            },
        }
    }

    /// Build a ranked snapshot of the session so far.
    pub fn snapshot(&self) -> AnalysisSnapshot {
        snapshot::build_snapshot(
            &self.tracker,
            self.detection.candidate_cap,
            self.detection.min_common_words,
        )
    }

    /// Look up a record by normalized key.
    pub fn record(&self, key: &str) -> Option<&NgramRecord> {
        self.tracker.get(key)
    }

    /// Number of tracked records.
    pub fn record_count(&self) -> usize {
        self.tracker.len()
    }

    /// Number of non-empty messages observed since the last reset.
    pub const fn observed(&self) -> usize {
        self.observed
    }

    /// The detection settings.
    pub const fn detection(&self) -> &DetectionConfig {
        &self.detection
    }

    /// The lexicon in use.
    pub const fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Forget everything observed. Settings, lexicon and oracle are kept.
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.candidates.clear();
        self.observed = 0;
        self.pending_messages = 0;
        tracing::debug!("session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SlopEngine {
        SlopEngine::new(DetectionConfig::default()).unwrap()
    }

    fn assert_maximal(engine: &SlopEngine) {
        let keys: Vec<String> = engine.candidates().into_iter().map(|c| c.key).collect();
        for a in &keys {
            for b in &keys {
                if a != b {
                    assert!(!b.contains(a.as_str()), "`{a}` is inside `{b}`");
                }
            }
        }
    }

    #[test]
    fn repeated_phrase_in_one_message_crosses_threshold() {
        let mut engine = engine();
        engine.observe(
            "he looked at her. He looked at her again. He looked at her once more.",
            0,
        );

        let record = engine.record("he look at").unwrap();
        assert_eq!(record.count, 3);
        assert!(record.score >= 3.0);
        assert!(
            engine
                .candidates()
                .iter()
                .any(|c| c.key.contains("he look at"))
        );
        assert_maximal(&engine);
    }

    #[test]
    fn merged_snapshot_pattern() {
        let mut engine = engine();
        for index in 0..3 {
            engine.observe("\"A flicker of doubt crossed his face.\"", index);
        }
        for index in 3..5 {
            engine.observe("\"A flicker of doubt crossed her face.\"", index);
        }
        let snapshot = engine.snapshot();
        assert!(
            snapshot
                .merged
                .iter()
                .any(|p| p.phrase == "a flicker of doubt crossed his/her face")
        );
    }

    #[test]
    fn single_word_never_tracked() {
        let mut engine = engine();
        for index in 0..10 {
            engine.observe("the", index);
        }
        assert_eq!(engine.record_count(), 0);
        assert!(engine.candidates().is_empty());
    }

    #[test]
    fn whitelisted_phrase_never_promoted() {
        let mut engine = engine();
        for index in 0..20 {
            engine.observe("Elara and Kael", index);
        }
        assert_eq!(engine.record_count(), 0);
        assert!(engine.candidates().is_empty());
    }

    #[test]
    fn stale_phrase_deleted_at_index_26() {
        let mut engine = engine();
        engine.ingest("\"she smiled softly\"", 5);
        assert!(engine.record("she smile softly").is_some());

        engine.prune(25);
        assert!(engine.record("she smile softly").is_some());

        let stats = engine.prune(26);
        assert!(stats.removed.contains(&"she smile softly".to_string()));
        assert!(engine.record("she smile softly").is_none());
    }

    #[test]
    fn decayed_candidates_leave_candidate_set() {
        let mut engine = engine();
        engine.ingest("A shiver ran down her spine.", 0);
        engine.ingest("A shiver ran down her spine.", 1);
        assert!(!engine.candidates().is_empty());

        for index in 100..120 {
            engine.prune(index);
        }
        assert!(engine.candidates().is_empty());
        assert_eq!(engine.record_count(), 0);
    }

    #[test]
    fn oracle_excludes_phrases() {
        let mut engine = engine().with_oracle(|phrase: &str| phrase.contains("spine"));
        for index in 0..5 {
            engine.observe("A shiver ran down her spine.", index);
        }
        assert!(engine.candidates().iter().all(|c| !c.original.contains("spine")));
    }

    #[test]
    fn mark_processed_accepts_surface_form() {
        let mut engine = engine();
        engine.ingest("He looked at her and looked at her.", 0);
        engine.ingest("He looked at her and looked at her.", 1);
        let candidate = engine.candidates().into_iter().next().unwrap();

        assert!(engine.mark_processed(&candidate.original));
        assert!(!engine.candidates().iter().any(|c| c.key == candidate.key));
        assert_eq!(engine.record(&candidate.key).map(|r| r.score), Some(0.0));
        assert!(!engine.mark_processed("never seen before"));
    }

    #[test]
    fn handoff_fires_after_pending_messages() {
        let mut engine = engine().with_handoff(HandoffConfig {
            trigger_after: Some(2),
            batch_size: 1,
        });
        let text = "A shiver ran down her spine. A shiver ran down her spine.";

        let first = engine.observe(text, 0);
        assert!(!first.promoted.is_empty());
        assert!(first.handoff.is_none());

        let second = engine.observe(text, 1);
        let batch = second.handoff.unwrap();
        assert_eq!(batch.candidates.len(), 1);

        assert!(engine.observe(text, 2).handoff.is_none());
    }

    #[test]
    fn handoff_count_carries_over_empty_candidate_set() {
        let mut engine = engine().with_handoff(HandoffConfig {
            trigger_after: Some(2),
            batch_size: 5,
        });

        let first = engine.observe("A shiver ran down her spine. A shiver ran down her spine.", 0);
        assert!(first.handoff.is_none());
        for candidate in engine.candidates() {
            engine.mark_processed(&candidate.key);
        }
        assert!(engine.candidates().is_empty());

        assert!(engine.observe("Yes.", 1).handoff.is_none());

        let third = engine.observe(
            "The lantern flickered in the dark. The lantern flickered in the dark.",
            2,
        );
        assert!(!third.promoted.is_empty());
        assert!(third.handoff.is_some());
    }

    #[test]
    fn refresh_lexicon_rejects_out_of_range_weights() {
        let mut engine = engine();
        for weight in [0, 11, 200] {
            let err = engine
                .refresh_lexicon(Vec::<String>::new(), HashMap::from([("ozone".to_string(), weight)]))
                .unwrap_err();
            assert!(err.to_string().contains("detection.blacklist"));
        }
        assert!(engine.lexicon().blacklist().is_empty());

        engine.observe("the smell of ozone", 0);
        let record = engine.record("smell of ozone").unwrap();
        assert!(record.score < 3.0);
    }

    #[test]
    fn refresh_lexicon_accepts_bounds() {
        let mut engine = engine();
        engine
            .refresh_lexicon(
                Vec::<String>::new(),
                HashMap::from([("ozone".to_string(), 1), ("whisper".to_string(), 10)]),
            )
            .unwrap();
        assert_eq!(engine.lexicon().blacklist().len(), 2);
    }

    #[test]
    fn promoted_lists_only_surviving_members() {
        let mut engine = engine();
        engine
            .refresh_lexicon(Vec::<String>::new(), HashMap::from([("ozone".to_string(), 5)]))
            .unwrap();

        let promoted = engine.ingest("the smell of ozone", 0);
        assert!(!promoted.is_empty());
        assert!(!promoted.iter().any(|key| key == "smell of ozone"));
        let members: Vec<String> = engine.candidates().into_iter().map(|c| c.key).collect();
        for key in &promoted {
            assert!(members.contains(key), "`{key}` was reported but is not a candidate");
        }
        assert_maximal(&engine);
    }

    #[test]
    fn aggressive_prune_removes_candidates_with_their_records() {
        let mut engine = SlopEngine::new(DetectionConfig {
            threshold: 1.5,
            whitelist: vec!["tin".to_string(), "cup".to_string()],
            ..DetectionConfig::default()
        })
        .unwrap();

        // One uncommon word in narration: 1.5 * 1.25, above the threshold
        // but a one-off below the aggressive keep score.
        let promoted = engine.ingest("tin cup rattles", 0);
        assert_eq!(promoted, vec!["tin cup rattles".to_string()]);
        let record = engine.record("tin cup rattles").unwrap();
        assert_eq!(record.count, 1);
        assert!(record.score < 2.0);

        let stats = engine.prune_aggressive();
        assert!(stats.removed.contains(&"tin cup rattles".to_string()));
        assert!(engine.record("tin cup rattles").is_none());
        assert!(engine.candidates().is_empty());
    }

    #[test]
    fn routine_prune_runs_on_interval() {
        let mut engine = SlopEngine::new(DetectionConfig {
            prune_interval: 3,
            ..DetectionConfig::default()
        })
        .unwrap();
        assert!(engine.observe("she smiled softly", 0).pruned.is_none());
        assert!(engine.observe("she smiled softly", 1).pruned.is_none());
        assert!(engine.observe("she smiled softly", 2).pruned.is_some());
    }

    #[test]
    fn refresh_lexicon_changes_filtering() {
        let mut engine = engine();
        engine
            .refresh_lexicon(["smell", "ozone"], HashMap::new())
            .unwrap();
        engine.observe("the smell of ozone", 0);
        assert_eq!(engine.record_count(), 0);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut engine = engine();
        engine.observe("A shiver ran down her spine. A shiver ran down her spine.", 0);
        engine.reset();
        assert_eq!(engine.record_count(), 0);
        assert!(engine.candidates().is_empty());
        assert_eq!(engine.observed(), 0);
    }

    #[test]
    fn empty_text_is_noop() {
        let mut engine = engine();
        assert_eq!(engine.observe("   ", 0), ObserveOutcome::default());
        assert_eq!(engine.observed(), 0);
    }

    #[test]
    fn invalid_detection_rejected() {
        let result = SlopEngine::new(DetectionConfig {
            min_n: 5,
            max_n: 2,
            ..DetectionConfig::default()
        });
        assert!(result.is_err());
    }
}
