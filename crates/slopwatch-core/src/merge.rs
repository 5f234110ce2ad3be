//! Pattern merging.
//!
//! Collapses a flat phrase → score map into readable patterns: phrases that
//! are fragments of longer ones are culled, then phrases sharing a leading
//! word run are clustered into `"<prefix> <v1>/<v2>"` patterns.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A phrase or pattern with its accumulated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoredPhrase {
    /// Phrase text, or a merged pattern with `/`-separated variations.
    pub phrase: String,
    /// Accumulated repetition score.
    pub score: f64,
}

impl ScoredPhrase {
    /// Create a scored phrase.
    pub fn new(phrase: impl Into<String>, score: f64) -> Self {
        Self {
            phrase: phrase.into(),
            score,
        }
    }
}

/// Output of [`merge_patterns`], both lists ranked by descending score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MergeOutcome {
    /// Merged patterns.
    pub merged: Vec<ScoredPhrase>,
    /// Phrases that did not join any pattern.
    pub remaining: Vec<ScoredPhrase>,
}

/// Order by descending score, then ascending phrase text.
pub fn rank(entries: &mut [ScoredPhrase]) {
    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.phrase.cmp(&b.phrase))
    });
}

/// Delete every phrase that is a literal substring of a longer phrase.
///
/// Phrases are visited longest first (ties in lexicographic order). Running
/// this on its own output changes nothing.
pub fn cull_substrings(phrases: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let mut order: Vec<&str> = phrases.keys().map(String::as_str).collect();
    order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut removed: BTreeSet<&str> = BTreeSet::new();
    for (i, longer) in order.iter().enumerate() {
        if removed.contains(longer) {
            continue;
        }
        for shorter in &order[i + 1..] {
            if !removed.contains(shorter) && longer.contains(shorter) {
                removed.insert(shorter);
            }
        }
    }

    phrases
        .iter()
        .filter(|(phrase, _)| !removed.contains(phrase.as_str()))
        .map(|(phrase, score)| (phrase.clone(), *score))
        .collect()
}

/// Cull substrings, cluster by shared leading words, and rank the result.
///
/// Two phrases join a group only when the group's full common prefix keeps
/// at least `min_common_words` words.
#[tracing::instrument(skip_all, fields(phrases = phrases.len()))]
pub fn merge_patterns(phrases: &BTreeMap<String, f64>, min_common_words: usize) -> MergeOutcome {
    let culled = cull_substrings(phrases);
    let entries: Vec<(Vec<&str>, &str, f64)> = culled
        .iter()
        .map(|(phrase, score)| (phrase.split_whitespace().collect(), phrase.as_str(), *score))
        .collect();

    let mut consumed = vec![false; entries.len()];
    let mut merged: BTreeMap<String, f64> = BTreeMap::new();

    for i in 0..entries.len() {
        if consumed[i] {
            continue;
        }
        let head = &entries[i].0;
        let mut group = vec![i];
        for j in i + 1..entries.len() {
            if !consumed[j] && common_prefix_len(head, &entries[j].0) >= min_common_words {
                group.push(j);
            }
        }
        if group.len() < 2 {
            continue;
        }

        let prefix_len = group
            .iter()
            .map(|&k| common_prefix_len(head, &entries[k].0))
            .min()
            .unwrap_or(0);
        if prefix_len < min_common_words {
            tracing::trace!(head = entries[i].1, prefix_len, "group abandoned");
            continue;
        }

        let mut total = 0.0;
        let mut scored: Vec<(Vec<&str>, f64)> = Vec::new();
        let mut any_empty = false;
        for &k in &group {
            consumed[k] = true;
            total += entries[k].2;
            let rest = &entries[k].0[prefix_len..];
            if rest.is_empty() {
                any_empty = true;
            } else if !scored.iter().any(|(v, _)| v.as_slice() == rest) {
                scored.push((rest.to_vec(), entries[k].2));
            }
        }
        // Strongest variation first, ties in phrase order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let variations: Vec<Vec<&str>> = scored.into_iter().map(|(v, _)| v).collect();

        let prefix = head[..prefix_len].join(" ");
        let pattern = render_pattern(&prefix, &variations, any_empty);
        *merged.entry(pattern).or_insert(0.0) += total;
    }

    let remaining: Vec<ScoredPhrase> = entries
        .iter()
        .zip(&consumed)
        .filter(|(_, consumed)| !**consumed)
        .filter(|((_, phrase, _), _)| {
            !merged
                .keys()
                .any(|pattern| pattern == phrase || pattern.starts_with(&format!("{phrase} ")))
        })
        .map(|((_, phrase, score), _)| ScoredPhrase::new(*phrase, *score))
        .collect();

    let mut outcome = MergeOutcome {
        merged: merged
            .into_iter()
            .map(|(phrase, score)| ScoredPhrase::new(phrase, score))
            .collect(),
        remaining,
    };
    rank(&mut outcome.merged);
    rank(&mut outcome.remaining);
    outcome
}

fn common_prefix_len(a: &[&str], b: &[&str]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Build `"<prefix> <v1>/<v2>"`, factoring out a shared trailing run when
/// every member contributed a variation.
fn render_pattern(prefix: &str, variations: &[Vec<&str>], any_empty: bool) -> String {
    if variations.is_empty() {
        return prefix.to_string();
    }

    let suffix_len = if any_empty || variations.len() < 2 {
        0
    } else {
        common_suffix_len(variations)
    };

    let alternatives = variations
        .iter()
        .map(|v| v[..v.len() - suffix_len].join(" "))
        .collect::<Vec<_>>()
        .join("/");

    if suffix_len == 0 {
        format!("{prefix} {alternatives}")
    } else {
        let first = &variations[0];
        let suffix = first[first.len() - suffix_len..].join(" ");
        format!("{prefix} {alternatives} {suffix}")
    }
}

/// Longest trailing word run shared by all variations that still leaves at
/// least one word in each.
fn common_suffix_len(variations: &[Vec<&str>]) -> usize {
    let max = variations.iter().map(|v| v.len() - 1).min().unwrap_or(0);
    let first = &variations[0];
    (0..max)
        .take_while(|&k| {
            let word = first[first.len() - 1 - k];
            variations.iter().all(|v| v[v.len() - 1 - k] == word)
        })
        .count()
}
