//! Watch command: live, message-by-message detection.

use std::io::BufRead;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use slopwatch_core::config::Config;
use slopwatch_core::transcript::{self, ChatMessage};
use slopwatch_core::{AnalysisSnapshot, ObserveOutcome, SlopEngine};

/// Arguments for the `watch` subcommand.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Transcript to replay. Reads stdin when omitted: one message per line,
    /// with lines starting with `{` parsed as JSONL chat records.
    pub file: Option<Utf8PathBuf>,

    /// Maximum entries in the final leaderboard.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Leave handed-off candidates in place instead of marking them processed.
    #[arg(long)]
    pub keep_handoff: bool,
}

/// One NDJSON line per message that changed something.
#[derive(Serialize)]
struct MessageEvent<'a> {
    event: &'static str,
    index: u64,
    #[serde(flatten)]
    outcome: &'a ObserveOutcome,
}

/// Final NDJSON line.
#[derive(Serialize)]
struct SummaryEvent<'a> {
    event: &'static str,
    observed: usize,
    records: usize,
    #[serde(flatten)]
    snapshot: &'a AnalysisSnapshot,
}

/// Feed messages through the engine one at a time.
#[instrument(name = "cmd_watch", skip_all, fields(file = ?args.file))]
pub fn cmd_watch(
    args: WatchArgs,
    global_json: bool,
    config: &Config,
    max_input: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = ?args.file, "executing watch command");
    let mut engine = SlopEngine::from_config(config).context("failed to build detection engine")?;
    let mut index = 0u64;

    let mut feed = |message: ChatMessage| -> anyhow::Result<()> {
        if !message.is_generated() {
            return Ok(());
        }
        let outcome = engine.observe(&message.text, index);
        report_outcome(&engine, index, &outcome, global_json)?;
        if let Some(batch) = outcome.handoff.as_ref()
            && !args.keep_handoff
        {
            for candidate in &batch.candidates {
                engine.mark_processed(&candidate.key);
            }
        }
        index += 1;
        Ok(())
    };

    match &args.file {
        Some(path) => {
            for message in super::read_transcript(path, max_input)? {
                feed(message)?;
            }
        }
        None => {
            let stdin = std::io::stdin();
            for (i, line) in stdin.lock().lines().enumerate() {
                let line = line.context("failed to read stdin")?;
                if line.trim().is_empty() {
                    continue;
                }
                if line.trim_start().starts_with('{') {
                    let parsed = transcript::parse(&line)
                        .with_context(|| format!("malformed record on stdin line {}", i + 1))?;
                    for message in parsed {
                        feed(message)?;
                    }
                } else {
                    feed(ChatMessage::generated(line))?;
                }
            }
        }
    }

    let snapshot = engine.snapshot();
    if global_json {
        let summary = SummaryEvent {
            event: "summary",
            observed: engine.observed(),
            records: engine.record_count(),
            snapshot: &snapshot,
        };
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    println!(
        "\n{} {} messages observed, {} phrases tracked",
        "Summary:".bold(),
        engine.observed(),
        engine.record_count()
    );
    if snapshot.is_empty() {
        println!("  {}", "No repetitive phrases found.".green());
    }
    for entry in snapshot.top(args.top) {
        println!("  {} {}", format!("{:>7.1}", entry.score).yellow(), entry.phrase);
    }
    Ok(())
}

fn report_outcome(
    engine: &SlopEngine,
    index: u64,
    outcome: &ObserveOutcome,
    json: bool,
) -> anyhow::Result<()> {
    if outcome == &ObserveOutcome::default() {
        return Ok(());
    }
    if json {
        let event = MessageEvent {
            event: "message",
            index,
            outcome,
        };
        println!("{}", serde_json::to_string(&event)?);
        return Ok(());
    }

    for key in &outcome.promoted {
        let (original, score) = engine
            .record(key)
            .map_or((key.as_str(), 0.0), |r| (r.original.as_str(), r.score));
        println!(
            "{} {} {} {}",
            format!("#{index}").dimmed(),
            "+".green(),
            original,
            format!("({score:.1})").dimmed()
        );
    }
    if let Some(stats) = outcome.pruned.as_ref().filter(|s| !s.is_empty()) {
        println!(
            "{} {}",
            format!("#{index}").dimmed(),
            format!(
                "pruned {} stale phrases, decayed {}",
                stats.removed.len(),
                stats.decayed
            )
            .dimmed()
        );
    }
    if let Some(batch) = &outcome.handoff {
        println!(
            "{} {} {} candidates",
            format!("#{index}").dimmed(),
            "hand-off:".cyan(),
            batch.candidates.len()
        );
        for candidate in &batch.candidates {
            println!("    {}", candidate.original);
        }
    }
    Ok(())
}
