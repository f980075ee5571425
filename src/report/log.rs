//! # Human-readable event log sink.
//!
//! Renders incoming [`Event`]s as `[kind] key=value` lines, to stdout or
//! to a log file. This is the default sink of the command-line binary.
//!
//! ## Example output
//! ```text
//! [started] target=5 concurrent=3 limit=4.5s interval=200ms capacity=20
//! [launched] worker=1 slot=0 sim=0.010000000s
//! [table] sim=0.510000000s occupied=3/20
//!   slot=0 worker=1 start=0.010000000s polls=2
//! [terminating] worker=1 slot=0 sim=1.260000000s polls=5
//! [reaped] worker=1 slot=0 sim=1.260000000s
//! [shutdown-requested] reason=signal
//! [finished] launched=5 cycles=47 sim=3.260000000s
//! [cleanup] complete
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::events::{Event, EventKind};

use super::sink::ReportSink;

enum LogTarget {
    Stdout,
    File(Mutex<File>),
}

/// Event writer sink.
pub struct LogWriter {
    target: LogTarget,
}

impl LogWriter {
    /// Writer printing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            target: LogTarget::Stdout,
        }
    }

    /// Writer appending lines to the file at `path` (created or
    /// truncated).
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            target: LogTarget::File(Mutex::new(File::create(path)?)),
        })
    }

    fn render(event: &Event) -> String {
        let reason = |e: &Event| e.reason.as_deref().unwrap_or("unknown").to_string();
        match event.kind {
            EventKind::SimulationStarted => {
                format!("[started] {}", reason(event))
            }
            EventKind::WorkerLaunched => format!(
                "[launched] worker={} slot={} sim={}",
                opt(event.identity),
                opt(event.slot),
                opt(event.sim),
            ),
            EventKind::WorkerTerminating => format!(
                "[terminating] worker={} slot={} sim={} polls={}",
                opt(event.identity),
                opt(event.slot),
                opt(event.sim),
                opt(event.polls),
            ),
            EventKind::WorkerReaped => format!(
                "[reaped] worker={} slot={} sim={}",
                opt(event.identity),
                opt(event.slot),
                opt(event.sim),
            ),
            EventKind::WorkerForced => format!(
                "[forced] worker={} reason={}",
                opt(event.identity),
                reason(event),
            ),
            EventKind::WorkerFailed => format!(
                "[worker-failed] worker={} reason={}",
                opt(event.identity),
                reason(event),
            ),
            EventKind::ShutdownRequested => {
                format!("[shutdown-requested] reason={}", reason(event))
            }
            EventKind::TableReport => {
                let mut line = format!("[table] sim={}", opt(event.sim));
                if let Some(table) = &event.table {
                    let _ = write!(
                        line,
                        " occupied={}/{}",
                        table.occupied(),
                        table.slots.len()
                    );
                    for (index, slot) in table.slots.iter().enumerate() {
                        if let Some(view) = slot {
                            let _ = write!(
                                line,
                                "\n  slot={} worker={} start={} polls={}",
                                index, view.identity, view.started_at, view.polls
                            );
                        }
                    }
                }
                line
            }
            EventKind::SimulationFinished => match event.summary {
                Some(summary) => format!(
                    "[finished] launched={} cycles={} sim={}",
                    summary.launched, summary.cycles, summary.sim_time
                ),
                None => "[finished]".to_string(),
            },
            EventKind::CleanupComplete => "[cleanup] complete".to_string(),
        }
    }
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "?".to_string(),
    }
}

#[async_trait]
impl ReportSink for LogWriter {
    async fn on_event(&self, event: &Event) {
        let line = Self::render(event);
        match &self.target {
            LogTarget::Stdout => println!("{line}"),
            LogTarget::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{line}");
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Identity;
    use crate::clock::SimTime;
    use crate::coordinator::SimSummary;

    #[test]
    fn test_render_launched_line() {
        let ev = Event::new(EventKind::WorkerLaunched)
            .with_identity(Identity::new(3))
            .with_slot(1)
            .with_sim(SimTime::new(0, 10_000_000));
        assert_eq!(
            LogWriter::render(&ev),
            "[launched] worker=3 slot=1 sim=0.010000000s"
        );
    }

    #[test]
    fn test_render_finished_line() {
        let ev = Event::new(EventKind::SimulationFinished).with_summary(SimSummary {
            launched: 5,
            cycles: 42,
            sim_time: SimTime::new(3, 0),
        });
        assert_eq!(
            LogWriter::render(&ev),
            "[finished] launched=5 cycles=42 sim=3.000000000s"
        );
    }

    #[test]
    fn test_render_shutdown_line() {
        let ev = Event::new(EventKind::ShutdownRequested).with_reason("signal");
        assert_eq!(LogWriter::render(&ev), "[shutdown-requested] reason=signal");
    }
}
