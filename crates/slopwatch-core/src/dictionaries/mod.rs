//! Dictionaries for slop detection.
//!
//! Provides the built-in lemma table used to unify inflected variants and the
//! default proper-name set that keeps character names out of the results.

pub mod lemmas;
pub mod names;
