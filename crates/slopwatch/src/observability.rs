//! Logging setup.
//!
//! Human-readable events go to stderr, filtered by `-q`/`-v` or `RUST_LOG`.
//! When a log directory or path is configured, the same events are also
//! written as JSON lines through a non-blocking `tracing-appender` writer.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Explicit log file path; wins over every directory setting.
const ENV_LOG_PATH: &str = "SLOPWATCH_LOG_PATH";
/// Log directory; wins over the `log_dir` config setting.
const ENV_LOG_DIR: &str = "SLOPWATCH_LOG_DIR";
/// File name prefix for daily-rotated logs.
const LOG_FILE_PREFIX: &str = "slopwatch.jsonl";

/// Where, if anywhere, to write the JSON log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// No file logging.
    #[default]
    None,
    /// A single file, never rotated.
    File(PathBuf),
    /// Daily-rotated files in a directory.
    Directory(PathBuf),
}

/// Resolved logging destinations.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// File log destination.
    pub target: LogTarget,
}

impl ObservabilityConfig {
    /// Resolve the log destination from the environment, falling back to the
    /// configured `log_dir`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let from_env = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let target = if let Some(path) = from_env(ENV_LOG_PATH) {
            LogTarget::File(path)
        } else if let Some(dir) = from_env(ENV_LOG_DIR).or(config_log_dir) {
            LogTarget::Directory(dir)
        } else {
            LogTarget::None
        };
        Self { target }
    }
}

/// Holds the background writer open; dropping it flushes the file log.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set. Otherwise `-q` shows only errors, each `-v`
/// steps up from the configured level, and dependencies stay at `warn`.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => default_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(format!("warn,slopwatch={level},slopwatch_core={level}"))
}

/// Install the global subscriber.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match file_writer(&config.target)? {
        Some((writer, guard)) => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(ObservabilityGuard { _file: guard })
}

fn file_writer(
    target: &LogTarget,
) -> anyhow::Result<Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)>> {
    let appender = match target {
        LogTarget::None => return Ok(None),
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log path has no file name: {}", path.display()))?;
            create_dir(dir)?;
            tracing_appender::rolling::never(dir, name)
        }
        LogTarget::Directory(dir) => {
            create_dir(dir)?;
            tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX)
        }
    };
    Ok(Some(tracing_appender::non_blocking(appender)))
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))
}
