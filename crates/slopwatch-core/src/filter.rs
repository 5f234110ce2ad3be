//! N-gram quality filtering.
//!
//! An n-gram reaches the frequency tracker only if it is long enough, not
//! already covered by an active correction rule, and carries at least one
//! word outside the effective whitelist.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::{RegexSet, RegexSetBuilder};

use crate::config::ExclusionConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::lexicon::Lexicon;

/// Answers whether a phrase is already handled downstream.
///
/// The engine does not know what a correction rule is; it only asks this
/// oracle before counting a phrase.
pub trait ExclusionOracle {
    /// Whether `phrase` (lowercase surface form) is already covered.
    fn is_already_handled(&self, phrase: &str) -> bool;
}

impl<F> ExclusionOracle for F
where
    F: Fn(&str) -> bool,
{
    fn is_already_handled(&self, phrase: &str) -> bool {
        self(phrase)
    }
}

/// Oracle that excludes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusions;

impl ExclusionOracle for NoExclusions {
    fn is_already_handled(&self, _phrase: &str) -> bool {
        false
    }
}

/// Oracle built from configured literal phrases and regex patterns.
///
/// Literal phrases match case-insensitively anywhere in the candidate.
/// Patterns are regular expressions tested case-insensitively.
#[derive(Debug, Clone)]
pub struct RuleOracle {
    phrases: Option<AhoCorasick>,
    patterns: RegexSet,
}

impl RuleOracle {
    /// Compile literal phrases and regex patterns into one oracle.
    pub fn new<P, S, R, T>(phrases: P, patterns: R) -> ConfigResult<Self>
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        let phrases = if phrases.is_empty() {
            None
        } else {
            Some(
                AhoCorasickBuilder::new()
                    .ascii_case_insensitive(true)
                    .build(&phrases)
                    .map_err(|e| ConfigError::InvalidPhrases(e.to_string()))?,
            )
        };

        let patterns = RegexSetBuilder::new(patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                source: Box::new(e),
            })?;

        Ok(Self { phrases, patterns })
    }

    /// Build the oracle from the `[exclusions]` settings.
    pub fn from_config(config: &ExclusionConfig) -> ConfigResult<Self> {
        Self::new(&config.phrases, &config.patterns)
    }

    /// Whether the oracle has no phrases and no patterns.
    pub fn is_empty(&self) -> bool {
        self.phrases.is_none() && self.patterns.is_empty()
    }
}

impl ExclusionOracle for RuleOracle {
    fn is_already_handled(&self, phrase: &str) -> bool {
        self.phrases.as_ref().is_some_and(|ac| ac.is_match(phrase))
            || self.patterns.is_match(phrase)
    }
}

/// Why an n-gram was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer words than the minimum window length.
    TooShort,
    /// The exclusion oracle already covers it.
    AlreadyHandled,
    /// Every word is in the effective whitelist.
    AllWhitelisted,
}

/// Stateless gate between n-gram extraction and frequency tracking.
pub struct QualityFilter<'a> {
    min_n: usize,
    lexicon: &'a Lexicon,
    oracle: &'a dyn ExclusionOracle,
}

impl<'a> QualityFilter<'a> {
    /// Create a filter for the given minimum length, lexicon and oracle.
    pub fn new(min_n: usize, lexicon: &'a Lexicon, oracle: &'a dyn ExclusionOracle) -> Self {
        Self {
            min_n,
            lexicon,
            oracle,
        }
    }

    /// Why `original` would be rejected, or `None` if it passes.
    pub fn rejection(&self, original: &str) -> Option<Rejection> {
        let word_count = original.split_whitespace().count();
        if word_count < self.min_n {
            return Some(Rejection::TooShort);
        }
        if self.oracle.is_already_handled(&original.to_lowercase()) {
            return Some(Rejection::AlreadyHandled);
        }
        if self.lexicon.is_all_whitelisted(original) {
            return Some(Rejection::AllWhitelisted);
        }
        None
    }

    /// Whether `original` may reach the frequency tracker.
    pub fn accept(&self, original: &str) -> bool {
        self.rejection(original).is_none()
    }
}
