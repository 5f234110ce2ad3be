//! Bulk analysis of a full transcript.
//!
//! Messages are fed in chunks. The cancellation flag is checked before each
//! message; the aggressive prune runs after each chunk to bound memory. A
//! cancelled run still reports everything observed so far.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use schemars::JsonSchema;
use serde::Serialize;

use crate::config::HistoryConfig;
use crate::engine::{Candidate, SlopEngine};
use crate::snapshot::AnalysisSnapshot;
use crate::transcript::ChatMessage;

/// How far a run has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Progress {
    /// Messages scanned, including skipped user and system messages.
    pub processed: usize,
    /// Messages in the transcript.
    pub total: usize,
    /// Generated messages fed to the engine.
    pub analyzed: usize,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct HistoryReport {
    /// Counts at the point the run stopped.
    pub progress: Progress,
    /// Whether the run stopped early.
    pub cancelled: bool,
    /// Records left in the frequency table.
    pub records: usize,
    /// Ranked leaderboard.
    pub snapshot: AnalysisSnapshot,
    /// Candidate-set members at the end of the run.
    pub candidates: Vec<Candidate>,
}

/// Messages sent from a background run.
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    /// A chunk finished.
    Progress(Progress),
    /// Periodic leaderboard.
    Interim(AnalysisSnapshot),
    /// The run is over; no further events follow.
    Finished(HistoryReport),
}

/// Analyze a transcript from a fresh session.
///
/// User and system messages are skipped; each generated message gets the
/// next message index. `on_event` receives progress after every chunk and an
/// interim snapshot every `snapshot_every` chunks.
#[tracing::instrument(skip_all, fields(messages = messages.len(), chunk_size = config.chunk_size))]
pub fn analyze(
    engine: &mut SlopEngine,
    messages: &[ChatMessage],
    config: &HistoryConfig,
    cancel: &AtomicBool,
    mut on_event: impl FnMut(HistoryEvent),
) -> HistoryReport {
    engine.reset();
    let chunk_size = config.chunk_size.max(1);
    let mut progress = Progress {
        processed: 0,
        total: messages.len(),
        analyzed: 0,
    };
    let mut cancelled = false;

    'chunks: for (chunk_index, chunk) in messages.chunks(chunk_size).enumerate() {
        for message in chunk {
            if cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break 'chunks;
            }
            progress.processed += 1;
            if !message.is_generated() {
                continue;
            }
            engine.ingest(&message.text, progress.analyzed as u64);
            progress.analyzed += 1;
        }

        let stats = engine.prune_aggressive();
        tracing::debug!(
            processed = progress.processed,
            total = progress.total,
            pruned = stats.removed.len(),
            "chunk analyzed"
        );
        on_event(HistoryEvent::Progress(progress));

        if config
            .snapshot_every
            .is_some_and(|every| every > 0 && (chunk_index + 1) % every == 0)
        {
            on_event(HistoryEvent::Interim(engine.snapshot()));
        }
    }

    if cancelled {
        tracing::info!(processed = progress.processed, "history analysis cancelled");
    } else {
        tracing::info!(analyzed = progress.analyzed, "history analysis complete");
    }

    HistoryReport {
        progress,
        cancelled,
        records: engine.record_count(),
        snapshot: engine.snapshot(),
        candidates: engine.candidates(),
    }
}

/// A background run started by [`spawn`].
#[derive(Debug)]
pub struct HistoryHandle {
    events: Receiver<HistoryEvent>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<SlopEngine>,
}

impl HistoryHandle {
    /// Events from the worker, ending with [`HistoryEvent::Finished`].
    pub const fn events(&self) -> &Receiver<HistoryEvent> {
        &self.events
    }

    /// Ask the worker to stop before its next message.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// A clone of the cancellation flag, e.g. for a signal handler.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Wait for the worker and take back the engine.
    pub fn join(self) -> std::thread::Result<SlopEngine> {
        self.thread.join()
    }
}

/// Run [`analyze`] on a worker thread that owns the engine.
///
/// The caller only sees one-way events; the engine comes back through
/// [`HistoryHandle::join`].
pub fn spawn(
    mut engine: SlopEngine,
    messages: Vec<ChatMessage>,
    config: HistoryConfig,
) -> std::io::Result<HistoryHandle> {
    let (tx, rx) = mpsc::channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let thread = std::thread::Builder::new()
        .name("slopwatch-history".to_string())
        .spawn(move || {
            let report = analyze(&mut engine, &messages, &config, &flag, |event| {
                // A dropped receiver just means nobody is listening.
                let _ = tx.send(event);
            });
            let _ = tx.send(HistoryEvent::Finished(report));
            engine
        })?;

    Ok(HistoryHandle {
        events: rx,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;

    fn engine() -> SlopEngine {
        SlopEngine::new(DetectionConfig::default()).unwrap()
    }

    fn transcript(generated: usize) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        for i in 0..generated {
            messages.push(ChatMessage {
                name: Some("You".to_string()),
                text: format!("A shiver ran down her spine, reply {i}."),
                is_user: true,
                is_system: false,
            });
            messages.push(ChatMessage::generated(
                "A shiver ran down her spine. Her breath hitched softly.",
            ));
        }
        messages
    }

    #[test]
    fn skips_user_messages() {
        let mut engine = engine();
        let messages = transcript(5);
        let report = analyze(
            &mut engine,
            &messages,
            &HistoryConfig::default(),
            &AtomicBool::new(false),
            |_| {},
        );
        assert!(!report.cancelled);
        assert_eq!(report.progress.processed, 10);
        assert_eq!(report.progress.analyzed, 5);
        // Only the generated text counts: five occurrences, not ten.
        assert_eq!(engine.record("a shiver run").map(|r| r.count), Some(5));
        assert!(!report.snapshot.is_empty());
        assert!(!report.candidates.is_empty());
    }

    #[test]
    fn reports_progress_per_chunk_and_interim_snapshots() {
        let mut engine = engine();
        let messages = transcript(10);
        let config = HistoryConfig {
            chunk_size: 4,
            snapshot_every: Some(2),
        };
        let mut progress = Vec::new();
        let mut interim = 0;
        analyze(
            &mut engine,
            &messages,
            &config,
            &AtomicBool::new(false),
            |event| match event {
                HistoryEvent::Progress(p) => progress.push(p.processed),
                HistoryEvent::Interim(_) => interim += 1,
                HistoryEvent::Finished(_) => unreachable!(),
            },
        );
        assert_eq!(progress, vec![4, 8, 12, 16, 20]);
        assert_eq!(interim, 2);
    }

    #[test]
    fn cancelled_run_keeps_partial_results() {
        let mut engine = engine();
        let messages = transcript(10);
        let cancel = AtomicBool::new(false);
        let config = HistoryConfig {
            chunk_size: 4,
            snapshot_every: None,
        };
        let report = analyze(&mut engine, &messages, &config, &cancel, |event| {
            if let HistoryEvent::Progress(p) = event
                && p.processed >= 8
            {
                cancel.store(true, Ordering::Relaxed);
            }
        });
        assert!(report.cancelled);
        assert_eq!(report.progress.processed, 8);
        assert_eq!(report.progress.analyzed, 4);
        assert!(report.records > 0);
    }

    #[test]
    fn each_run_starts_fresh() {
        let mut engine = engine();
        let messages = transcript(3);
        let never = AtomicBool::new(false);
        analyze(&mut engine, &messages, &HistoryConfig::default(), &never, |_| {});
        analyze(&mut engine, &messages, &HistoryConfig::default(), &never, |_| {});
        assert_eq!(engine.record("a shiver run").map(|r| r.count), Some(3));
    }

    #[test]
    fn spawned_run_finishes_and_returns_engine() {
        let handle = spawn(engine(), transcript(6), HistoryConfig::default()).unwrap();
        let mut finished = None;
        for event in handle.events() {
            if let HistoryEvent::Finished(report) = event {
                finished = Some(report);
            }
        }
        let report = finished.expect("finished event");
        assert_eq!(report.progress.analyzed, 6);
        let engine = handle.join().unwrap();
        assert_eq!(engine.observed(), 0);
        assert!(engine.record_count() > 0);
    }
}
