//! Error types for slopwatch-core.
//!
//! The detection engine itself never fails on text input; these errors cover
//! the fallible edges around it (configuration and transcript parsing).

use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// A setting was deserialized but has an unusable value.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending setting (e.g. `detection.min_n`).
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// An exclusion pattern failed to compile.
    #[error("invalid exclusion pattern: {source}")]
    InvalidPattern {
        /// The underlying regex error.
        #[source]
        source: Box<regex::Error>,
    },

    /// Literal exclusion phrases could not be compiled into a matcher.
    #[error("invalid exclusion phrases: {0}")]
    InvalidPhrases(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while reading a chat transcript.
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// A JSONL line could not be parsed.
    #[error("malformed transcript line {line}: {source}")]
    Line {
        /// One-based line number.
        line: usize,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A JSON array transcript could not be parsed.
    #[error("malformed transcript: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using [`TranscriptError`].
pub type TranscriptResult<T> = Result<T, TranscriptError>;
