//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with sensible defaults
//!
//! # Supported formats
//!
//! The following configuration file formats are supported:
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `slopwatch.<ext>` in current directory or any parent
//! - `.slopwatch.<ext>` in current directory or any parent
//! - `~/.config/slopwatch/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! When multiple files exist in the same directory, all are merged via figment.
//! Later extensions override earlier: toml < yaml < yml < json.
//!
//! Environment variables prefixed with `SLOPWATCH_` override everything;
//! nested keys use a double underscore (`SLOPWATCH_DETECTION__THRESHOLD=4`).
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use slopwatch_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! config.detection.validate().unwrap();
//! ```

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default shortest n-gram length.
pub const DEFAULT_MIN_N: usize = 3;
/// Default longest n-gram length.
pub const DEFAULT_MAX_N: usize = 10;
/// Default notability threshold a score must cross to become a candidate.
pub const DEFAULT_THRESHOLD: f64 = 3.0;
/// Default number of messages after which an unseen record counts as stale.
pub const DEFAULT_STALE_WINDOW: u64 = 20;
/// Default number of observed messages between routine prunes.
pub const DEFAULT_PRUNE_INTERVAL: usize = 10;
/// Default cap on records fed to the pattern merger.
pub const DEFAULT_CANDIDATE_CAP: usize = 2000;
/// Default minimum shared leading words for a merged pattern.
pub const DEFAULT_MIN_COMMON_WORDS: usize = 3;
/// Default number of messages per bulk-analysis chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 20;
/// Default number of candidates per hand-off batch.
pub const DEFAULT_HANDOFF_BATCH: usize = 50;

/// Detection settings: window lengths, scoring threshold, pruning cadence
/// and the user word lists.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct DetectionConfig {
    /// Shortest n-gram length considered.
    pub min_n: usize,
    /// Longest n-gram length considered.
    pub max_n: usize,
    /// Score a phrase must cross upward to become a candidate.
    pub threshold: f64,
    /// Messages without a sighting before a record is considered stale.
    pub stale_window: u64,
    /// Observed messages between routine prunes.
    pub prune_interval: usize,
    /// Maximum records considered when building a snapshot.
    pub candidate_cap: usize,
    /// Minimum shared leading words for two phrases to merge.
    pub min_common_words: usize,
    /// Extra words that never make a phrase distinctive.
    pub whitelist: Vec<String>,
    /// Words or phrases to prioritize, with a weight from 1 to 10.
    pub blacklist: HashMap<String, u8>,
    /// Extra lemma mappings (inflected form → canonical form).
    pub lemmas: HashMap<String, String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_n: DEFAULT_MIN_N,
            max_n: DEFAULT_MAX_N,
            threshold: DEFAULT_THRESHOLD,
            stale_window: DEFAULT_STALE_WINDOW,
            prune_interval: DEFAULT_PRUNE_INTERVAL,
            candidate_cap: DEFAULT_CANDIDATE_CAP,
            min_common_words: DEFAULT_MIN_COMMON_WORDS,
            whitelist: Vec::new(),
            blacklist: HashMap::new(),
            lemmas: HashMap::new(),
        }
    }
}

impl DetectionConfig {
    /// Check the settings once, before a session starts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_n == 0 {
            return Err(ConfigError::invalid("detection.min_n", "must be at least 1"));
        }
        if self.min_n > self.max_n {
            return Err(ConfigError::invalid(
                "detection.max_n",
                format!("must be >= min_n ({})", self.min_n),
            ));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::invalid(
                "detection.threshold",
                "must be a positive number",
            ));
        }
        if self.prune_interval == 0 {
            return Err(ConfigError::invalid(
                "detection.prune_interval",
                "must be at least 1",
            ));
        }
        if self.candidate_cap == 0 {
            return Err(ConfigError::invalid(
                "detection.candidate_cap",
                "must be at least 1",
            ));
        }
        if self.min_common_words == 0 {
            return Err(ConfigError::invalid(
                "detection.min_common_words",
                "must be at least 1",
            ));
        }
        validate_blacklist(&self.blacklist)
    }
}

/// Reject blacklist weights outside 1 to 10.
pub fn validate_blacklist(blacklist: &HashMap<String, u8>) -> ConfigResult<()> {
    match blacklist
        .iter()
        .find(|(_, weight)| !(1..=10).contains(*weight))
    {
        Some((word, weight)) => Err(ConfigError::invalid(
            "detection.blacklist",
            format!("weight for `{word}` is {weight}, expected 1 to 10"),
        )),
        None => Ok(()),
    }
}

/// Phrases already covered by active correction rules.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Literal phrases, matched case-insensitively.
    pub phrases: Vec<String>,
    /// Regular expressions, matched case-insensitively.
    pub patterns: Vec<String>,
}

/// Settings for bulk transcript analysis.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct HistoryConfig {
    /// Messages fed per chunk before pruning and reporting progress.
    pub chunk_size: usize,
    /// Emit an interim snapshot every this many chunks. Omit to disable.
    pub snapshot_every: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            snapshot_every: None,
        }
    }
}

/// Settings for handing candidates off to a downstream consumer.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct HandoffConfig {
    /// Offer a batch after this many messages with pending candidates.
    /// Omit to disable automatic hand-off.
    pub trigger_after: Option<usize>,
    /// Maximum candidates per batch.
    pub batch_size: usize,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            trigger_after: None,
            batch_size: DEFAULT_HANDOFF_BATCH,
        }
    }
}

/// The configuration for slopwatch.
///
/// Deserialized from config files found during discovery (TOML, YAML, or
/// JSON) and from `SLOPWATCH_` environment variables.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files. File logging is off when unset.
    pub log_dir: Option<Utf8PathBuf>,
    /// Maximum input size in bytes (default: 32 MiB).
    ///
    /// Omit to use the default. Use `disable_input_limit` to remove the
    /// limit entirely.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely.
    #[serde(default)]
    pub disable_input_limit: bool,
    /// Detection settings.
    pub detection: DetectionConfig,
    /// Exclusion oracle settings.
    pub exclusions: ExclusionConfig,
    /// Bulk analysis settings.
    pub history: HistoryConfig,
    /// Hand-off settings.
    pub handoff: HandoffConfig,
}

impl Config {
    /// Validate every section that has constraints beyond its type.
    pub fn validate(&self) -> ConfigResult<()> {
        self.detection.validate()?;
        if self.history.chunk_size == 0 {
            return Err(ConfigError::invalid(
                "history.chunk_size",
                "must be at least 1",
            ));
        }
        if self.history.snapshot_every == Some(0) {
            return Err(ConfigError::invalid(
                "history.snapshot_every",
                "must be at least 1 when set",
            ));
        }
        if self.handoff.trigger_after == Some(0) {
            return Err(ConfigError::invalid(
                "handoff.trigger_after",
                "must be at least 1 when set",
            ));
        }
        if self.handoff.batch_size == 0 {
            return Err(ConfigError::invalid(
                "handoff.batch_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Metadata about which configuration sources were loaded.
///
/// Returned alongside [`Config`] from [`ConfigLoader::load()`] so commands
/// can report the actual config files without re-discovering them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project config files found by walking up, ordered low→high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file from XDG config directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit config files loaded (e.g., from `--config` flag).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// Returns the highest-precedence config file that was loaded.
    ///
    /// Precedence: explicit files > project files > user file.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .map(Utf8PathBuf::as_path)
            .or_else(|| self.project_files.last().map(Utf8PathBuf::as_path))
            .or(self.user_file.as_deref())
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "slopwatch";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SLOPWATCH_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Stop searching when we hit a directory containing this file/dir.
    boundary_marker: Option<String>,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/slopwatch/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Set a boundary marker to stop directory traversal.
    ///
    /// When walking up directories, stop if we find a directory containing
    /// this file or directory name. Default is `.git`.
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Disable boundary marker (search all the way to filesystem root).
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. `SLOPWATCH_` environment variables
    /// 2. Explicit files (in order added via `with_file`)
    /// 3. Project config (closest to search root)
    /// 4. User config (`~/.config/slopwatch/config.<ext>`)
    /// 5. Default values
    ///
    /// The merged config is validated before it is returned.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(ref root) = self.project_search_root {
            let project_configs = self.find_project_configs(root);
            for pc in &project_configs {
                figment = Self::merge_file(figment, pc);
            }
            sources.project_files = project_configs;
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // SLOPWATCH_LOG_LEVEL=debug, SLOPWATCH_DETECTION__THRESHOLD=4, etc.
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        config.validate()?;
        tracing::info!(
            log_level = config.log_level.as_str(),
            threshold = config.detection.threshold,
            min_n = config.detection.min_n,
            max_n = config.detection.max_n,
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Load configuration, returning an error if no config file is found.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && self.find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());
        let has_explicit = !self.explicit_files.is_empty();

        if !has_user && !has_project && !has_explicit {
            return Err(ConfigError::NotFound);
        }

        self.load()
    }

    /// Find project config files by walking up from the given directory.
    ///
    /// Returns all matching config files from the closest directory that has
    /// any match, ordered low-to-high precedence: dotfiles before regular
    /// files, then by extension.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let mut found = Vec::new();

            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    found.push(dotfile);
                }
            }
            for ext in CONFIG_EXTENSIONS {
                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    found.push(regular);
                }
            }

            if !found.is_empty() {
                return found;
            }

            // Check for boundary marker AFTER checking config files,
            // so a config in the same directory as the marker is found.
            if let Some(ref marker) = self.boundary_marker
                && dir.join(marker).exists()
                && dir != start
            {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        Vec::new()
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;

        for ext in CONFIG_EXTENSIONS {
            let config_path = config_dir.join(format!("config.{ext}"));
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        None
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("toml") => figment.merge(Toml::file_exact(path.as_str())),
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Get the project directories for XDG-compliant path resolution.
///
/// Returns `None` if the home directory cannot be determined.
fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Get the user config directory path.
///
/// Returns `~/.config/slopwatch/` on Linux, `~/Library/Application Support/slopwatch/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
