//! Lexicon inputs for the detector.
//!
//! Bundles the lemma table, the built-in common-word and proper-name sets,
//! the user whitelist and the user blacklist, and derives the effective
//! whitelist that the quality filter and scorer consult.

use std::collections::{HashMap, HashSet};

use crate::config::DetectionConfig;
use crate::dictionaries::lemmas;
use crate::dictionaries::names::DEFAULT_NAMES;
use crate::word_lists::COMMON_WORDS;

/// Word lists and lemma dictionary consulted during detection.
///
/// Read-only while a session runs. Changing the user lists goes through
/// [`Lexicon::refresh`], which recomputes the effective whitelist.
#[derive(Debug, Clone)]
pub struct Lexicon {
    lemma_overrides: HashMap<String, String>,
    whitelist: HashSet<String>,
    blacklist: HashMap<String, u8>,
    effective_whitelist: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexicon {
    /// Built-in lists only: no user whitelist, blacklist or lemma overrides.
    pub fn new() -> Self {
        let mut lexicon = Self {
            lemma_overrides: HashMap::new(),
            whitelist: HashSet::new(),
            blacklist: HashMap::new(),
            effective_whitelist: HashSet::new(),
        };
        lexicon.rebuild();
        lexicon
    }

    /// Build a lexicon from the `[detection]` settings.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new()
            .with_lemmas(config.lemmas.clone())
            .with_whitelist(config.whitelist.iter().cloned())
            .with_blacklist(config.blacklist.clone())
    }

    /// Add user lemma overrides (inflected form → canonical form).
    pub fn with_lemmas(mut self, lemmas: HashMap<String, String>) -> Self {
        self.lemma_overrides = lemmas
            .into_iter()
            .map(|(form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
            .collect();
        self
    }

    /// Replace the user whitelist.
    pub fn with_whitelist<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.whitelist = normalize_words(words);
        self.rebuild();
        self
    }

    /// Replace the user blacklist (word or phrase → weight).
    pub fn with_blacklist(mut self, blacklist: HashMap<String, u8>) -> Self {
        self.blacklist = normalize_blacklist(blacklist);
        self
    }

    /// Swap in new user lists and recompute the effective whitelist.
    #[tracing::instrument(skip_all)]
    pub fn refresh<I, S>(&mut self, whitelist: I, blacklist: HashMap<String, u8>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.whitelist = normalize_words(whitelist);
        self.blacklist = normalize_blacklist(blacklist);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.effective_whitelist = COMMON_WORDS
            .iter()
            .chain(DEFAULT_NAMES.iter())
            .map(|w| (*w).to_string())
            .chain(self.whitelist.iter().cloned())
            .collect();
        tracing::debug!(
            size = self.effective_whitelist.len(),
            user_words = self.whitelist.len(),
            "effective whitelist updated"
        );
    }

    /// Canonical form of a lowercased word; the word itself when unknown.
    pub fn lemmatize<'a>(&'a self, word: &'a str) -> &'a str {
        if let Some(lemma) = self.lemma_overrides.get(word) {
            return lemma;
        }
        lemmas::lemma_of(word).unwrap_or(word)
    }

    /// Whether a lowercased word is in the effective whitelist.
    pub fn is_whitelisted(&self, word: &str) -> bool {
        self.effective_whitelist.contains(word)
    }

    /// Number of words outside the effective whitelist.
    pub fn uncommon_word_count(&self, phrase: &str) -> usize {
        phrase
            .split_whitespace()
            .filter(|w| !self.is_whitelisted(w))
            .count()
    }

    /// Whether every word of the phrase is whitelisted.
    pub fn is_all_whitelisted(&self, phrase: &str) -> bool {
        phrase.split_whitespace().all(|w| self.is_whitelisted(w))
    }

    /// Highest blacklist weight found in the phrase, 0 when none.
    ///
    /// Single-word entries match any word of the phrase. Multi-word entries
    /// match when they occur in the phrase on word boundaries.
    pub fn blacklist_weight(&self, phrase: &str) -> u8 {
        if self.blacklist.is_empty() {
            return 0;
        }
        let lowered = phrase.to_lowercase();
        let padded = format!(" {} ", lowered.split_whitespace().collect::<Vec<_>>().join(" "));

        self.blacklist
            .iter()
            .filter(|(entry, _)| {
                if entry.contains(' ') {
                    padded.contains(&format!(" {entry} "))
                } else {
                    lowered.split_whitespace().any(|w| w == entry.as_str())
                }
            })
            .map(|(_, weight)| *weight)
            .max()
            .unwrap_or(0)
    }

    /// Size of the effective whitelist.
    pub fn effective_whitelist_len(&self) -> usize {
        self.effective_whitelist.len()
    }

    /// The user blacklist.
    pub const fn blacklist(&self) -> &HashMap<String, u8> {
        &self.blacklist
    }
}

fn normalize_words<I, S>(words: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn normalize_blacklist(blacklist: HashMap<String, u8>) -> HashMap<String, u8> {
    blacklist
        .into_iter()
        .map(|(entry, weight)| {
            let entry = entry.split_whitespace().collect::<Vec<_>>().join(" ");
            (entry.to_lowercase(), weight)
        })
        .filter(|(entry, _)| !entry.is_empty())
        .collect()
}
