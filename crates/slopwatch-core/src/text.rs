//! Text normalization.
//!
//! Strips structural markup from a raw message and splits what remains into
//! narration and dialogue segments for n-gram extraction.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Tags whose contents are never prose (status panels, code, scripts).
const NON_PROSE_TAGS: &[&str] = &["info_panel", "memo", "code", "pre", "script", "style"];

/// Regex for fenced code blocks (``` or ~~~).
static FENCED_CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(?:```|~~~)\w*\s*.*?(?:```|~~~)").expect("valid regex"));

/// One regex per non-prose tag, matching the element with its contents.
static NON_PROSE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    NON_PROSE_TAGS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid regex")
        })
        .collect()
});

/// Regex for any remaining tag-like markup.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Regex for emphasis wrappers (*, _, ~, `), keeping the inner text.
static EMPHASIS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\*|_|~|`)+(.+?)(?:\*|_|~|`)+").expect("valid regex"));

/// Regex for blockquote markers at line start.
static BLOCKQUOTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").expect("valid regex"));

/// Regex for parenthetical wrappers, keeping the inner text.
static PARENTHETICAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)").expect("valid regex"));

/// Whether a segment is narration or quoted speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Text outside quotes.
    Narration,
    /// Text inside a quote pair.
    Dialogue,
}

impl SegmentKind {
    /// Returns the kind as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Narration => "narration",
            Self::Dialogue => "dialogue",
        }
    }
}

/// A run of cleaned text with its narration/dialogue classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    text: String,
    kind: SegmentKind,
}

impl Segment {
    /// Create a segment. Surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>, kind: SegmentKind) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            kind,
        }
    }

    /// Shorthand for a narration segment.
    pub fn narration(text: impl AsRef<str>) -> Self {
        Self::new(text, SegmentKind::Narration)
    }

    /// Shorthand for a dialogue segment.
    pub fn dialogue(text: impl AsRef<str>) -> Self {
        Self::new(text, SegmentKind::Dialogue)
    }

    /// The segment text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The segment kind.
    pub const fn kind(&self) -> SegmentKind {
        self.kind
    }
}

/// Strip markup and split a raw message into segments.
///
/// Never fails: unbalanced quotes fall back to narration and empty input
/// yields no segments.
#[tracing::instrument(skip_all, fields(text_len = raw.len()))]
pub fn normalize(raw: &str) -> Vec<Segment> {
    let clean = strip_markup(raw);
    if clean.is_empty() {
        return Vec::new();
    }
    split_segments(&clean)
}

/// Remove code, non-prose tags, remaining tags and formatting wrappers.
pub fn strip_markup(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text = FENCED_CODE_PATTERN.replace_all(raw, " ").into_owned();
    for pattern in NON_PROSE_PATTERNS.iter() {
        text = pattern.replace_all(&text, " ").into_owned();
    }
    text = TAG_PATTERN.replace_all(&text, " ").into_owned();
    text = EMPHASIS_PATTERN.replace_all(&text, "$1").into_owned();
    text = BLOCKQUOTE_PATTERN.replace_all(&text, "").into_owned();
    text = PARENTHETICAL_PATTERN.replace_all(&text, "$1").into_owned();

    text.trim_matches(|c: char| c.is_whitespace() || c == '*')
        .to_string()
}

/// Split cleaned text into alternating narration and dialogue segments.
pub fn split_segments(clean: &str) -> Vec<Segment> {
    let chars: Vec<(usize, char)> = clean.char_indices().collect();
    let mut segments = Vec::new();
    let mut narration_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (open_pos, open_ch) = chars[i];
        let Some(close_ch) = opening_quote(&chars, i) else {
            i += 1;
            continue;
        };

        match find_closing_quote(&chars, i + 1, close_ch) {
            Some(j) => {
                let (close_pos, close_ch) = chars[j];
                push_segment(
                    &mut segments,
                    &clean[narration_start..open_pos],
                    SegmentKind::Narration,
                );
                push_segment(
                    &mut segments,
                    &clean[open_pos + open_ch.len_utf8()..close_pos],
                    SegmentKind::Dialogue,
                );
                narration_start = close_pos + close_ch.len_utf8();
                i = j + 1;
            }
            // A stray apostrophe-like quote is just a character.
            None if open_ch == '\'' => i += 1,
            // Unbalanced double quote: the rest is narration.
            None => break,
        }
    }

    push_segment(
        &mut segments,
        &clean[narration_start..],
        SegmentKind::Narration,
    );
    segments
}

fn push_segment(segments: &mut Vec<Segment>, text: &str, kind: SegmentKind) {
    if !text.trim().is_empty() {
        segments.push(Segment::new(text, kind));
    }
}

/// If the char at `i` opens a quoted span, return the char that closes it.
fn opening_quote(chars: &[(usize, char)], i: usize) -> Option<char> {
    let prev = i.checked_sub(1).map(|p| chars[p].1);
    if prev == Some('\\') {
        return None;
    }
    match chars[i].1 {
        '"' => Some('"'),
        '\u{201c}' => Some('\u{201d}'),
        // Contractions, possessives and elisions never open dialogue.
        '\'' if prev.is_none_or(|c| !c.is_alphanumeric()) && !starts_elision(chars, i + 1) => {
            Some('\'')
        }
        _ => None,
    }
}

/// Words commonly written with a leading apostrophe.
const ELISIONS: &[&str] = &["bout", "cause", "em", "n", "round", "til", "tis", "twas"];

fn starts_elision(chars: &[(usize, char)], from: usize) -> bool {
    let word: String = chars[from.min(chars.len())..]
        .iter()
        .map(|(_, c)| *c)
        .take_while(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();
    ELISIONS.contains(&word.as_str())
}

/// A single quote closes only right after a non-`s` letter, a digit or
/// punctuation, so plural possessives like `dogs'` stay inside narration.
fn closes_single_quote(chars: &[(usize, char)], k: usize) -> bool {
    let prev = k.checked_sub(1).map(|p| chars[p].1);
    let next = chars.get(k + 1).map(|(_, c)| *c);
    let attached = prev.is_some_and(|c| {
        (c.is_alphanumeric() && !matches!(c, 's' | 'S')) || (c.is_ascii_punctuation() && c != '\'')
    });
    attached && next.is_none_or(|c| !c.is_alphanumeric())
}

fn find_closing_quote(chars: &[(usize, char)], from: usize, close: char) -> Option<usize> {
    let mut k = from;
    while k < chars.len() {
        let ch = chars[k].1;
        if ch == '\\' {
            k += 2;
            continue;
        }
        if ch == close && (close != '\'' || closes_single_quote(chars, k)) {
            return Some(k);
        }
        k += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n\t").is_empty());
    }

    #[test]
    fn plain_narration() {
        let segments = normalize("She walked into the room.");
        assert_eq!(segments, vec![Segment::narration("She walked into the room.")]);
    }

    #[test]
    fn fenced_code_removed() {
        let clean = strip_markup("Before.\n```rust\nlet x = 1;\n```\nAfter.");
        assert!(!clean.contains("let x"));
        assert!(clean.contains("Before."));
        assert!(clean.contains("After."));
    }

    #[test]
    fn non_prose_tags_removed_with_contents() {
        let clean = strip_markup("Hello <info_panel>HP: 10/10</info_panel> there <b>bold</b>.");
        assert!(!clean.contains("HP"));
        assert!(clean.contains("bold"));
        assert!(!clean.contains('<'));
    }

    #[test]
    fn emphasis_and_parentheses_unwrapped() {
        let clean = strip_markup("*She smiled* and (quietly) left _at once_.");
        assert_eq!(clean, "She smiled and quietly left at once.");
    }

    #[test]
    fn blockquote_markers_removed() {
        let clean = strip_markup("> a quoted line\n> another");
        assert_eq!(clean, "a quoted line\nanother");
    }

    #[test]
    fn splits_narration_and_dialogue() {
        let segments = normalize(r#"He paused. "Are you sure?" she asked softly."#);
        assert_eq!(
            segments,
            vec![
                Segment::narration("He paused."),
                Segment::dialogue("Are you sure?"),
                Segment::narration("she asked softly."),
            ]
        );
    }

    #[test]
    fn curly_and_single_quotes_are_dialogue() {
        let segments = normalize("\u{201c}Come here,\u{201d} he said. 'Now.'");
        let kinds: Vec<_> = segments.iter().map(Segment::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Dialogue,
                SegmentKind::Narration,
                SegmentKind::Dialogue
            ]
        );
    }

    #[test]
    fn contractions_do_not_open_dialogue() {
        let segments = normalize("She didn't know what he'd done.");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind(), SegmentKind::Narration);
    }

    #[test]
    fn elisions_and_plural_possessives_stay_narration() {
        let segments = normalize("He told 'em to leave. The dogs' bowl sat empty.");
        assert_eq!(
            segments,
            vec![Segment::narration(
                "He told 'em to leave. The dogs' bowl sat empty."
            )]
        );
    }

    #[test]
    fn single_quoted_speech_after_elision() {
        let segments = normalize("'Cause of that, she said 'Go home.' and left.");
        let kinds: Vec<_> = segments.iter().map(Segment::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Narration,
                SegmentKind::Dialogue,
                SegmentKind::Narration
            ]
        );
        assert_eq!(segments[1], Segment::dialogue("Go home."));
    }

    #[test]
    fn escaped_quote_does_not_close_span() {
        let segments = normalize(r#"He said "a \"quoted\" word" loudly"#);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].kind(), SegmentKind::Dialogue);
        assert!(segments[1].text().contains("quoted"));
    }

    #[test]
    fn unbalanced_quote_becomes_trailing_narration() {
        let segments = normalize(r#""Hi," she said. "And then it trailed off"#);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], Segment::dialogue("Hi,"));
        assert_eq!(segments[1].kind(), SegmentKind::Narration);
        assert!(segments[1].text().ends_with("trailed off"));
    }

    #[test]
    fn empty_quotes_dropped() {
        let segments = normalize(r#"Nothing "" here"#);
        assert_eq!(
            segments,
            vec![Segment::narration("Nothing"), Segment::narration("here")]
        );
    }
}
