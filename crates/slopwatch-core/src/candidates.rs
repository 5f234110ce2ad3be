//! Promoted phrases awaiting hand-off.
//!
//! Members are normalized keys. No member is ever a substring of another:
//! promoting a longer phrase evicts the shorter ones it contains, and
//! promoting a phrase already covered by a member does nothing.

use std::collections::BTreeSet;

/// Set of promoted phrase keys under the maximal-phrase invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    members: BTreeSet<String>,
}

impl CandidateSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `key` unless a member already contains it.
    ///
    /// Members contained in `key` are removed first. Returns whether `key`
    /// was inserted.
    pub fn promote(&mut self, key: &str) -> bool {
        if self.members.iter().any(|m| m.contains(key)) {
            return false;
        }
        self.members.retain(|m| !key.contains(m.as_str()));
        self.members.insert(key.to_string());
        true
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.members.remove(key)
    }

    /// Whether `key` is a member.
    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    /// Members in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.members.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_maximal(set: &CandidateSet) {
        for a in set.iter() {
            for b in set.iter() {
                if a != b {
                    assert!(!b.contains(a), "`{a}` is inside `{b}`");
                }
            }
        }
    }

    #[test]
    fn longer_phrase_evicts_contained_members() {
        let mut set = CandidateSet::new();
        assert!(set.promote("look at"));
        assert!(set.promote("he look at"));
        assert!(set.promote("he look at her"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["he look at her"]);
    }

    #[test]
    fn contained_phrase_is_ignored() {
        let mut set = CandidateSet::new();
        set.promote("a shiver run down her spine");
        assert!(!set.promote("shiver run down"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_promote_is_noop() {
        let mut set = CandidateSet::new();
        assert!(set.promote("he look at"));
        assert!(!set.promote("he look at"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn invariant_holds_under_mixed_promotions() {
        let mut set = CandidateSet::new();
        for key in [
            "look at her",
            "she smile soft",
            "he look at her",
            "look at",
            "smile soft",
            "she smile soft at him",
            "a flicker of doubt",
            "flicker of doubt cross",
        ] {
            set.promote(key);
            assert_maximal(&set);
        }
        assert!(set.contains("he look at her"));
        assert!(set.contains("she smile soft at him"));
        assert!(!set.contains("look at"));
    }

    #[test]
    fn remove_and_clear() {
        let mut set = CandidateSet::new();
        set.promote("he look at");
        set.promote("she smile soft");
        assert!(set.remove("he look at"));
        assert!(!set.remove("he look at"));
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
    }
}
