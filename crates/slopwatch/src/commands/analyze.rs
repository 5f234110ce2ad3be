//! Analyze command: bulk repetition analysis of a whole transcript.

use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use slopwatch_core::config::Config;
use slopwatch_core::history::{self, HistoryEvent, HistoryReport};
use slopwatch_core::merge::ScoredPhrase;
use slopwatch_core::{SlopEngine, SnapshotNotice};

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Transcript to analyze (JSONL chat export, JSON array, or plain text).
    pub file: Utf8PathBuf,

    /// Maximum patterns and phrases to show.
    #[arg(long, default_value_t = 25)]
    pub top: usize,

    /// Messages per chunk (overrides `history.chunk_size`).
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Analyze a transcript on a worker thread and print the leaderboard.
#[instrument(name = "cmd_analyze", skip_all, fields(file = %args.file))]
pub fn cmd_analyze(
    args: AnalyzeArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, top = args.top, "executing analyze command");

    let messages = super::read_transcript(&args.file, max_input)?;
    let engine = SlopEngine::from_config(config).context("failed to build detection engine")?;

    let mut history_config = config.history.clone();
    if let Some(chunk_size) = args.chunk_size {
        anyhow::ensure!(chunk_size > 0, "--chunk-size must be at least 1");
        history_config.chunk_size = chunk_size;
    }

    let progress = if global_json || args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(messages.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} messages")
                .context("invalid progress template")?
                .progress_chars("=> "),
        );
        bar
    };

    let handle = history::spawn(engine, messages, history_config)
        .context("failed to start analysis thread")?;

    let mut report = None;
    for event in handle.events() {
        match event {
            HistoryEvent::Progress(p) => progress.set_position(p.processed as u64),
            HistoryEvent::Interim(snapshot) => debug!(
                patterns = snapshot.merged.len(),
                phrases = snapshot.remaining.len(),
                "interim snapshot"
            ),
            HistoryEvent::Finished(r) => report = Some(r),
        }
    }
    progress.finish_and_clear();
    handle
        .join()
        .map_err(|_| anyhow!("analysis thread panicked"))?;

    let mut report = report.context("analysis finished without a report")?;
    report.snapshot.merged.truncate(args.top);
    report.snapshot.remaining.truncate(args.top);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&args.file, &report);
    Ok(())
}

fn print_report(file: &Utf8Path, report: &HistoryReport) {
    println!(
        "{} {} of {} messages analyzed, {} phrases tracked",
        file.bold(),
        report.progress.analyzed,
        report.progress.total,
        report.records,
    );

    for notice in &report.snapshot.notices {
        match notice {
            SnapshotNotice::Truncated { found, kept } => println!(
                "  {} {found} phrases qualified, kept the top {kept}",
                "note:".yellow()
            ),
            SnapshotNotice::Empty => println!("\n  {}", "No repetitive phrases found.".green()),
        }
    }

    print_section("Patterns", &report.snapshot.merged);
    print_section("Phrases", &report.snapshot.remaining);

    if !report.candidates.is_empty() {
        println!("\n  {} ({})", "Candidates:".cyan(), report.candidates.len());
        for candidate in &report.candidates {
            println!(
                "    {} {}",
                format!("{:>7.1}", candidate.score).dimmed(),
                candidate.original
            );
        }
    }
}

fn print_section(title: &str, entries: &[ScoredPhrase]) {
    if entries.is_empty() {
        return;
    }
    println!("\n  {}", format!("{title}:").cyan());
    for entry in entries {
        println!("    {} {}", format!("{:>7.1}", entry.score).yellow(), entry.phrase);
    }
}
