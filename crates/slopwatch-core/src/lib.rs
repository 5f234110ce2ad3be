//! Core library for slopwatch.
//!
//! This crate finds phrases that generated prose keeps repeating. Messages
//! are normalized, cut into n-grams, filtered, and scored; phrases whose
//! score crosses a threshold become candidates, and on demand the scored
//! table is merged into a ranked leaderboard of patterns.
//!
//! # Modules
//!
//! - [`engine`] - The detection session tying everything together
//! - [`text`] - Markup stripping and narration/dialogue segmentation
//! - [`ngrams`] - N-gram extraction
//! - [`filter`] - Quality filtering and the exclusion oracle
//! - [`tracker`] - The scored frequency table
//! - [`candidates`] - Promoted phrases under the maximal-phrase invariant
//! - [`merge`] - Substring culling and prefix clustering
//! - [`snapshot`] - Ranked leaderboards
//! - [`history`] - Chunked, cancellable bulk analysis
//! - [`transcript`] - Chat transcript parsing
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use slopwatch_core::{ConfigLoader, SlopEngine};
//!
//! let (config, _sources) = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! let mut engine = SlopEngine::from_config(&config).expect("valid exclusions");
//! engine.observe("A shiver ran down her spine.", 0);
//! engine.observe("Again, a shiver ran down her spine.", 1);
//!
//! for candidate in engine.candidates() {
//!     println!("{} ({:.1})", candidate.original, candidate.score);
//! }
//! ```
#![deny(unsafe_code)]

pub mod candidates;
pub mod config;
pub mod dictionaries;
pub mod engine;
pub mod error;
pub mod filter;
pub mod history;
pub mod lexicon;
pub mod merge;
pub mod ngrams;
pub mod snapshot;
pub mod text;
pub mod tracker;
pub mod transcript;
pub mod word_lists;

pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use engine::{Candidate, HandoffBatch, ObserveOutcome, SlopEngine};
pub use error::{ConfigError, ConfigResult, TranscriptError, TranscriptResult};
pub use filter::{ExclusionOracle, NoExclusions, RuleOracle};
pub use snapshot::{AnalysisSnapshot, SnapshotNotice};
pub use transcript::ChatMessage;

/// Default maximum input size: 32 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 32 * 1024 * 1024;
