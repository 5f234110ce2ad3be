//! Built-in lemma table.
//!
//! Maps inflected word forms to a canonical form so that "she looked at him"
//! and "she looks at him" accumulate under the same key. Words missing from
//! the table stand for themselves.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Inflected form → canonical form.
pub static LEMMAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Regular verbs common in narration
    for (lemma, forms) in [
        ("look", ["looks", "looked", "looking"]),
        ("stare", ["stares", "stared", "staring"]),
        ("glance", ["glances", "glanced", "glancing"]),
        ("smile", ["smiles", "smiled", "smiling"]),
        ("smirk", ["smirks", "smirked", "smirking"]),
        ("grin", ["grins", "grinned", "grinning"]),
        ("laugh", ["laughs", "laughed", "laughing"]),
        ("chuckle", ["chuckles", "chuckled", "chuckling"]),
        ("sigh", ["sighs", "sighed", "sighing"]),
        ("whisper", ["whispers", "whispered", "whispering"]),
        ("murmur", ["murmurs", "murmured", "murmuring"]),
        ("nod", ["nods", "nodded", "nodding"]),
        ("shrug", ["shrugs", "shrugged", "shrugging"]),
        ("tilt", ["tilts", "tilted", "tilting"]),
        ("lean", ["leans", "leaned", "leaning"]),
        ("reach", ["reaches", "reached", "reaching"]),
        ("touch", ["touches", "touched", "touching"]),
        ("turn", ["turns", "turned", "turning"]),
        ("walk", ["walks", "walked", "walking"]),
        ("step", ["steps", "stepped", "stepping"]),
        ("pause", ["pauses", "paused", "pausing"]),
        ("narrow", ["narrows", "narrowed", "narrowing"]),
        ("widen", ["widens", "widened", "widening"]),
        ("flicker", ["flickers", "flickered", "flickering"]),
        ("glint", ["glints", "glinted", "glinting"]),
        ("sparkle", ["sparkles", "sparkled", "sparkling"]),
        ("cross", ["crosses", "crossed", "crossing"]),
        ("send", ["sends", "sent", "sending"]),
        ("shiver", ["shivers", "shivered", "shivering"]),
        ("tremble", ["trembles", "trembled", "trembling"]),
        ("curl", ["curls", "curled", "curling"]),
        ("crinkle", ["crinkles", "crinkled", "crinkling"]),
        ("wrap", ["wraps", "wrapped", "wrapping"]),
        ("pull", ["pulls", "pulled", "pulling"]),
        ("push", ["pushes", "pushed", "pushing"]),
        ("brush", ["brushes", "brushed", "brushing"]),
        ("trace", ["traces", "traced", "tracing"]),
        ("linger", ["lingers", "lingered", "lingering"]),
        ("echo", ["echoes", "echoed", "echoing"]),
        ("fill", ["fills", "filled", "filling"]),
        ("hang", ["hangs", "hanged", "hanging"]),
        ("feel", ["feels", "felt", "feeling"]),
        ("seem", ["seems", "seemed", "seeming"]),
        ("breathe", ["breathes", "breathed", "breathing"]),
        ("swallow", ["swallows", "swallowed", "swallowing"]),
        ("clench", ["clenches", "clenched", "clenching"]),
        ("tighten", ["tightens", "tightened", "tightening"]),
        ("soften", ["softens", "softened", "softening"]),
        ("dance", ["dances", "danced", "dancing"]),
        ("play", ["plays", "played", "playing"]),
    ] {
        for form in forms {
            map.insert(form, lemma);
        }
    }

    // Irregular verbs
    map.extend([
        ("hung", "hang"),
        ("caught", "catch"),
        ("catches", "catch"),
        ("catching", "catch"),
        ("took", "take"),
        ("taken", "take"),
        ("takes", "take"),
        ("taking", "take"),
        ("gave", "give"),
        ("given", "give"),
        ("gives", "give"),
        ("giving", "give"),
        ("made", "make"),
        ("makes", "make"),
        ("making", "make"),
        ("let", "let"),
        ("lets", "let"),
        ("letting", "let"),
        ("held", "hold"),
        ("holds", "hold"),
        ("holding", "hold"),
        ("bit", "bite"),
        ("bitten", "bite"),
        ("bites", "bite"),
        ("biting", "bite"),
        ("ran", "run"),
        ("runs", "run"),
        ("running", "run"),
        ("spoke", "speak"),
        ("spoken", "speak"),
        ("speaks", "speak"),
        ("speaking", "speak"),
        ("knew", "know"),
        ("known", "know"),
        ("knows", "know"),
        ("knowing", "know"),
        ("saw", "see"),
        ("seen", "see"),
        ("sees", "see"),
        ("seeing", "see"),
        ("said", "say"),
        ("says", "say"),
        ("saying", "say"),
        ("rose", "rise"),
        ("risen", "rise"),
        ("rises", "rise"),
        ("rising", "rise"),
        ("fell", "fall"),
        ("fallen", "fall"),
        ("falls", "fall"),
        ("falling", "fall"),
        ("grew", "grow"),
        ("grown", "grow"),
        ("grows", "grow"),
        ("growing", "grow"),
        ("shook", "shake"),
        ("shaken", "shake"),
        ("shakes", "shake"),
        ("shaking", "shake"),
        ("stood", "stand"),
        ("stands", "stand"),
        ("standing", "stand"),
        ("thought", "think"),
        ("thinks", "think"),
        ("thinking", "think"),
        ("drew", "draw"),
        ("drawn", "draw"),
        ("draws", "draw"),
        ("drawing", "draw"),
        ("left", "leave"),
        ("leaves", "leave"),
        ("leaving", "leave"),
    ]);

    // Plural nouns
    map.extend([
        ("eyes", "eye"),
        ("lips", "lip"),
        ("hands", "hand"),
        ("fingers", "finger"),
        ("shoulders", "shoulder"),
        ("cheeks", "cheek"),
        ("voices", "voice"),
        ("words", "word"),
        ("shivers", "shiver"),
        ("spines", "spine"),
        ("smiles", "smile"),
        ("breaths", "breath"),
        ("whispers", "whisper"),
        ("shadows", "shadow"),
        ("moments", "moment"),
        ("hearts", "heart"),
        ("teeth", "tooth"),
        ("feet", "foot"),
    ]);

    map
});

/// Look up the canonical form of a word, if the table knows one.
pub fn lemma_of(word: &str) -> Option<&'static str> {
    LEMMAS.get(word).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_forms_map_to_base() {
        assert_eq!(lemma_of("looked"), Some("look"));
        assert_eq!(lemma_of("staring"), Some("stare"));
        assert_eq!(lemma_of("crossed"), Some("cross"));
    }

    #[test]
    fn irregular_forms_map_to_base() {
        assert_eq!(lemma_of("sent"), Some("send"));
        assert_eq!(lemma_of("teeth"), Some("tooth"));
    }

    #[test]
    fn unknown_word_has_no_lemma() {
        assert_eq!(lemma_of("xylophone"), None);
    }
}
