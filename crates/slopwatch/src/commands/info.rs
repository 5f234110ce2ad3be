//! Info command implementation

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use slopwatch_core::config::{Config, ConfigSources, DetectionConfig, HandoffConfig, HistoryConfig};
use tracing::{debug, instrument};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    homepage: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            homepage: env!("CARGO_PKG_HOMEPAGE"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ExclusionInfo {
    phrases: usize,
    patterns: usize,
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_input_bytes: Option<usize>,
    detection: DetectionConfig,
    exclusions: ExclusionInfo,
    history: HistoryConfig,
    handoff: HandoffConfig,
}

impl ConfigInfo {
    fn from_config(config: &Config, sources: &ConfigSources) -> Self {
        let max_input_bytes = if config.disable_input_limit {
            None
        } else {
            Some(
                config
                    .max_input_bytes
                    .unwrap_or(slopwatch_core::DEFAULT_MAX_INPUT_BYTES),
            )
        };
        Self {
            config_file: sources.primary_file().map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            max_input_bytes,
            detection: config.detection.clone(),
            exclusions: ExclusionInfo {
                phrases: config.exclusions.phrases.len(),
                patterns: config.exclusions.patterns.len(),
            },
            history: config.history.clone(),
            handoff: config.handoff.clone(),
        }
    }
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
}

/// Print package information
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `sources` - Config source metadata from loading
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    _args: InfoArgs,
    global_json: bool,
    config: &Config,
    sources: &ConfigSources,
) -> anyhow::Result<()> {
    let info = PackageInfo::new();

    debug!(json_output = global_json, "executing info command");

    let config_info = ConfigInfo::from_config(config, sources);
    let full_info = FullInfo {
        package: info,
        config: config_info,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&full_info)?);
        return Ok(());
    }

    let package = &full_info.package;
    println!("{} {}", package.name.bold(), package.version.green());
    if !package.description.is_empty() {
        println!("{}", package.description);
    }
    if !package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), package.license);
    }
    if !package.repository.is_empty() {
        println!("{}: {}", "Repository".dimmed(), package.repository.cyan());
    }

    let cfg = &full_info.config;
    println!();
    println!("{}", "Configuration".bold().underline());
    match cfg.config_file {
        Some(ref path) => println!("{}: {}", "Config file".dimmed(), path.cyan()),
        None => println!("{}: {}", "Config file".dimmed(), "none loaded".yellow()),
    }
    println!("{}: {}", "Log level".dimmed(), cfg.log_level);
    if let Some(ref dir) = cfg.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    match cfg.max_input_bytes {
        Some(max) => println!("{}: {} bytes", "Input limit".dimmed(), max),
        None => println!("{}: {}", "Input limit".dimmed(), "disabled".yellow()),
    }

    let d = &cfg.detection;
    println!();
    println!("{}", "Detection".bold().underline());
    println!("{}: {}..={}", "N-gram lengths".dimmed(), d.min_n, d.max_n);
    println!("{}: {:.1}", "Threshold".dimmed(), d.threshold);
    println!("{}: {} messages", "Stale window".dimmed(), d.stale_window);
    println!("{}: every {} messages", "Routine prune".dimmed(), d.prune_interval);
    println!("{}: {}", "Candidate cap".dimmed(), d.candidate_cap);
    println!("{}: {}", "Min common words".dimmed(), d.min_common_words);
    println!(
        "{}: {} whitelist, {} blacklist, {} lemma overrides",
        "User lists".dimmed(),
        d.whitelist.len(),
        d.blacklist.len(),
        d.lemmas.len()
    );
    println!(
        "{}: {} phrases, {} patterns",
        "Exclusions".dimmed(),
        cfg.exclusions.phrases,
        cfg.exclusions.patterns
    );
    match cfg.handoff.trigger_after {
        Some(after) => println!(
            "{}: after {} messages, {} per batch",
            "Hand-off".dimmed(),
            after,
            cfg.handoff.batch_size
        ),
        None => println!("{}: {}", "Hand-off".dimmed(), "(not set)".dimmed()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config::default()
    }

    fn test_sources() -> ConfigSources {
        ConfigSources::default()
    }

    #[test]
    fn test_cmd_info_text_succeeds() {
        assert!(cmd_info(InfoArgs::default(), false, &test_config(), &test_sources()).is_ok());
    }

    #[test]
    fn test_cmd_info_json_via_global() {
        assert!(cmd_info(InfoArgs::default(), true, &test_config(), &test_sources()).is_ok());
    }

    #[test]
    fn test_config_info_no_file() {
        let config = Config::default();
        let sources = ConfigSources::default();
        let info = ConfigInfo::from_config(&config, &sources);
        assert!(info.config_file.is_none());
        assert_eq!(info.log_level, "info");
        assert_eq!(
            info.max_input_bytes,
            Some(slopwatch_core::DEFAULT_MAX_INPUT_BYTES)
        );
    }

    #[test]
    fn test_config_info_disabled_limit() {
        let config = Config {
            disable_input_limit: true,
            ..Config::default()
        };
        let info = ConfigInfo::from_config(&config, &ConfigSources::default());
        assert!(info.max_input_bytes.is_none());
    }
}
