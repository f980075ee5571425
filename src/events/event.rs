//! # Runtime events emitted by the coordinator.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! for it: timestamps, the worker identity and slot, simulated time, and
//! payloads such as table snapshots or the final summary.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use schedsim::{Event, EventKind, Identity, SimTime};
//!
//! let ev = Event::new(EventKind::WorkerLaunched)
//!     .with_identity(Identity::new(1))
//!     .with_slot(0)
//!     .with_sim(SimTime::new(0, 10_000_000));
//!
//! assert_eq!(ev.kind, EventKind::WorkerLaunched);
//! assert_eq!(ev.slot, Some(0));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::channel::Identity;
use crate::clock::SimTime;
use crate::coordinator::SimSummary;
use crate::table::TableSnapshot;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of simulation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run lifecycle ===
    /// The coordinator initialized its resources and entered the loop.
    ///
    /// Sets: `sim`, `reason` (effective configuration).
    SimulationStarted,

    /// The loop exited and teardown finished; the run summary follows.
    ///
    /// Sets: `sim`, `summary`.
    SimulationFinished,

    /// All resources were released; nothing of the run remains.
    CleanupComplete,

    /// A shutdown was requested (signal, wall-clock limit, or caller).
    ///
    /// Sets: `reason`.
    ShutdownRequested,

    // === Worker lifecycle ===
    /// A worker was launched into a table slot.
    ///
    /// Sets: `identity`, `slot`, `sim`.
    WorkerLaunched,

    /// A polled worker answered that it reached its deadline.
    ///
    /// Sets: `identity`, `slot`, `sim`, `polls`.
    WorkerTerminating,

    /// A finished worker was joined and its slot released.
    ///
    /// Sets: `identity`, `slot`, `sim`.
    WorkerReaped,

    /// A worker had to be aborted after exceeding a grace period.
    ///
    /// Sets: `identity`, `reason`.
    WorkerForced,

    /// A worker task ended with an error or panic.
    ///
    /// Sets: `identity`, `reason`.
    WorkerFailed,

    // === Reporting ===
    /// Periodic process-table report.
    ///
    /// Sets: `sim`, `table`.
    TableReport,
}

/// Simulation event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker identity, if applicable.
    pub identity: Option<Identity>,
    /// Process-table slot, if applicable.
    pub slot: Option<usize>,
    /// Simulated time at which the event occurred.
    pub sim: Option<SimTime>,
    /// Completed poll count, if applicable.
    pub polls: Option<u64>,
    /// Human-readable detail (shutdown causes, failure messages).
    pub reason: Option<Arc<str>>,
    /// Process-table snapshot (table reports only).
    pub table: Option<TableSnapshot>,
    /// Final run summary (simulation finish only).
    pub summary: Option<SimSummary>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            identity: None,
            slot: None,
            sim: None,
            polls: None,
            reason: None,
            table: None,
            summary: None,
        }
    }

    /// Attaches a worker identity.
    #[inline]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Attaches a table slot index.
    #[inline]
    pub fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Attaches the simulated time of the event.
    #[inline]
    pub fn with_sim(mut self, sim: SimTime) -> Self {
        self.sim = Some(sim);
        self
    }

    /// Attaches a completed poll count.
    #[inline]
    pub fn with_polls(mut self, polls: u64) -> Self {
        self.polls = Some(polls);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a process-table snapshot.
    #[inline]
    pub fn with_table(mut self, table: TableSnapshot) -> Self {
        self.table = Some(table);
        self
    }

    /// Attaches the final run summary.
    #[inline]
    pub fn with_summary(mut self, summary: SimSummary) -> Self {
        self.summary = Some(summary);
        self
    }
}
