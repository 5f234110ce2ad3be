//! N-gram extraction.
//!
//! Produces aligned pairs of surface-form and lemmatized n-grams from a
//! segment. The lemmatized form keys the frequency table; the surface form
//! is what gets displayed and handed off.

use crate::lexicon::Lexicon;
use crate::text::Segment;

/// One extracted window in both forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ngram {
    /// Surface words joined by single spaces.
    pub original: String,
    /// Lemmatized words joined by single spaces.
    pub normalized: String,
    /// Window length in words.
    pub n: usize,
}

/// Split segment text into lowercase word tokens.
///
/// Sentence punctuation (`. , ! ?`) is removed before splitting on
/// whitespace; empty tokens are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .filter(|c| !matches!(c, '.' | ',' | '!' | '?'))
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Join every window of `n` consecutive words.
///
/// Yields `words.len() - n + 1` windows, or none when `n` exceeds the word
/// count (or is zero).
pub fn windows<S: AsRef<str>>(words: &[S], n: usize) -> Vec<String> {
    if n == 0 || words.len() < n {
        return Vec::new();
    }
    words
        .windows(n)
        .map(|w| {
            w.iter()
                .map(<S as AsRef<str>>::as_ref)
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .collect()
}

/// Extract all n-grams of length `min_n..=max_n` from a segment.
///
/// Output is ordered by window length, then position.
pub fn extract(segment: &Segment, min_n: usize, max_n: usize, lexicon: &Lexicon) -> Vec<Ngram> {
    let original_words = tokenize(segment.text());
    let lemmatized_words: Vec<&str> = original_words
        .iter()
        .map(|w| lexicon.lemmatize(w))
        .collect();

    let mut ngrams = Vec::new();
    for n in min_n.max(1)..=max_n {
        if original_words.len() < n {
            break;
        }
        let originals = windows(&original_words, n);
        let normalized = windows(&lemmatized_words, n);
        ngrams.extend(
            originals
                .into_iter()
                .zip(normalized)
                .map(|(original, normalized)| Ngram {
                    original,
                    normalized,
                    n,
                }),
        );
    }
    ngrams
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_strips_sentence_punctuation() {
        assert_eq!(
            tokenize("Wait, what?! He left."),
            vec!["wait", "what", "he", "left"]
        );
    }

    #[test]
    fn tokenize_keeps_apostrophes() {
        assert_eq!(tokenize("Don't go"), vec!["don't", "go"]);
    }

    #[test]
    fn window_count_matches_formula() {
        let words: Vec<String> = "one two three four five"
            .split(' ')
            .map(str::to_string)
            .collect();
        for n in 1..=5 {
            assert_eq!(windows(&words, n).len(), words.len() - n + 1, "n = {n}");
        }
        assert!(windows(&words, 6).is_empty());
        assert!(windows(&words, 0).is_empty());
    }

    #[test]
    fn extract_produces_aligned_forms() {
        let lexicon = Lexicon::new();
        let segment = Segment::narration("She looked at him and smiled.");
        let ngrams = extract(&segment, 3, 3, &lexicon);
        assert_eq!(ngrams.len(), 4);
        assert_eq!(ngrams[0].original, "she looked at");
        assert_eq!(ngrams[0].normalized, "she look at");
        assert_eq!(ngrams[3].original, "him and smiled");
        assert_eq!(ngrams[3].normalized, "him and smile");
    }

    #[test]
    fn extract_covers_every_length() {
        let lexicon = Lexicon::new();
        let segment = Segment::narration("a b c d e");
        let ngrams = extract(&segment, 3, 10, &lexicon);
        // 3 + 2 + 1 windows for n = 3, 4, 5
        assert_eq!(ngrams.len(), 6);
        assert!(ngrams.windows(2).all(|w| w[0].n <= w[1].n));
    }

    #[test]
    fn short_segment_yields_nothing() {
        let lexicon = Lexicon::new();
        let segment = Segment::dialogue("Hello there");
        assert!(extract(&segment, 3, 10, &lexicon).is_empty());
    }
}
