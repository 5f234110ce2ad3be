//! Default proper names.
//!
//! Names recur constantly in roleplay transcripts without being slop. The
//! set leans toward the names generated fiction reaches for most often.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Lowercased default proper names.
pub static DEFAULT_NAMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut set = HashSet::new();

    // Stock fantasy names
    set.extend([
        "elara", "kael", "lyra", "seraphina", "aria", "zephyr", "thorne", "rowan", "aurelia",
        "kaelen", "elias", "lira", "nyx", "orion", "silas", "evelyn", "isolde", "caspian",
        "alaric", "anya", "mira", "talia", "valen", "kira", "darius", "lucian", "selene",
        "sable", "ember", "ash", "raven", "finn", "cassius", "elowen", "thalia",
    ]);

    // Common English given names
    set.extend([
        "james", "john", "robert", "michael", "william", "david", "richard", "joseph", "thomas",
        "charles", "daniel", "matthew", "mark", "paul", "steven", "andrew", "jack", "henry",
        "sam", "alex", "ben", "tom", "mary", "patricia", "jennifer", "linda", "elizabeth",
        "sarah", "jessica", "emily", "emma", "anna", "lily", "grace", "chloe", "sophie", "lucy",
        "kate", "rose", "claire", "luna", "maya",
    ]);

    // Chat placeholders
    set.extend(["user", "char"]);

    set
});

/// Check if a word is a default proper name.
pub fn is_default_name(word: &str) -> bool {
    DEFAULT_NAMES.contains(word.to_lowercase().as_str())
}
