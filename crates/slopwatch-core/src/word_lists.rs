//! Curated word lists for slop detection.
//!
//! Common function words carry no distinguishing vocabulary: a phrase built
//! only from these (plus names and user-whitelisted words) is never flagged.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Common English words (articles, pronouns, prepositions, auxiliaries,
/// conjunctions and high-frequency adverbs).
pub static COMMON_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();

    // Articles and determiners
    set.extend([
        "a", "an", "the", "this", "that", "these", "those", "some", "any", "each", "every", "no",
        "all", "both", "either", "neither", "another", "other", "such", "much", "many", "more",
        "most", "few", "fewer", "less", "least", "several", "own", "same",
    ]);

    // Pronouns and possessives
    set.extend([
        "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "yourselves", "he",
        "him", "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we",
        "us", "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves", "who",
        "whom", "whose", "which", "what", "whatever", "whoever", "someone", "something",
        "anyone", "anything", "everyone", "everything", "nobody", "nothing", "one", "ones",
        "i'm", "you're", "he's", "she's", "it's", "we're", "they're", "i've", "you've", "we've",
        "they've", "i'd", "you'd", "he'd", "she'd", "we'd", "they'd", "i'll", "you'll", "he'll",
        "she'll", "we'll", "they'll", "that's", "there's", "what's",
    ]);

    // Prepositions
    set.extend([
        "about", "above", "across", "after", "against", "along", "among", "around", "as", "at",
        "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite",
        "down", "during", "except", "for", "from", "in", "inside", "into", "like", "near", "of",
        "off", "on", "onto", "out", "outside", "over", "past", "since", "through", "throughout",
        "to", "toward", "towards", "under", "until", "up", "upon", "with", "within", "without",
    ]);

    // Auxiliaries and modals
    set.extend([
        "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
        "do", "does", "did", "doing", "done", "will", "would", "shall", "should", "can", "could",
        "may", "might", "must", "ought", "don't", "doesn't", "didn't", "isn't", "aren't",
        "wasn't", "weren't", "won't", "wouldn't", "can't", "couldn't", "shouldn't", "haven't",
        "hasn't", "hadn't",
    ]);

    // Conjunctions
    set.extend([
        "and", "but", "or", "nor", "so", "yet", "because", "although", "though", "while",
        "whereas", "if", "unless", "than", "then", "when", "whenever", "where", "wherever",
        "whether", "how", "why", "once",
    ]);

    // High-frequency adverbs and particles
    set.extend([
        "not", "now", "just", "only", "also", "very", "too", "still", "even", "again", "ever",
        "never", "always", "here", "there", "well", "back", "away", "really", "quite", "almost",
        "already", "soon", "yes", "no", "oh", "ah", "okay", "ok",
    ]);

    set
});

/// Check if a word is a common English word.
pub fn is_common_word(word: &str) -> bool {
    COMMON_WORDS.contains(word.to_lowercase().as_str())
}
