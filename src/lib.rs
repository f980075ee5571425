//! # schedsim
//!
//! **Schedsim** is an OS process-scheduler simulator for Rust.
//!
//! A coordinator drives a simulated clock, launches a bounded population
//! of worker tasks into a fixed-capacity process table, and polls them in
//! round-robin order over an identity-addressed request/reply channel
//! until every worker has run out its randomly drawn lifetime.
//!
//! ## Architecture
//! ### Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Coordinator (scheduling engine)                                │
//! │  - ClockDriver (sole writer of simulated time)                  │
//! │  - ProcessTable (fixed-capacity slots, round-robin cursor)      │
//! │  - launch schedule (target, concurrency cap, launch interval)   │
//! └───────┬──────────────────────┬──────────────────────┬───────────┘
//!         │ Poll                 │ Poll                 │ Poll
//!         ▼                      ▼                      ▼
//!  ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//!  │  Worker #1  │        │  Worker #2  │        │  Worker #N  │
//!  │ (deadline)  │        │ (deadline)  │        │ (deadline)  │
//!  └──────┬──────┘        └──────┬──────┘        └──────┬──────┘
//!         │ Status(Running | Terminating)               │
//!         └──────────────────────┼──────────────────────┘
//!                                ▼
//!              SyncChannel (identity-addressed mailboxes,
//!                     FIFO per identity, request/reply)
//!
//! The coordinator, the watchdog, and the teardown sweep publish Events:
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                     │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 ▼
//!                        ┌─────────────────┐
//!                        │  sink listener  │
//!                        │ (in Coordinator)│
//!                        └────────┬────────┘
//!                                 ▼
//!                        SinkSet (per-sink queues)
//!                        ▼         ▼         ▼
//!                     sink1.on  sink2.on  sinkN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Loop
//! ```text
//! Coordinator::run()
//!
//! loop {
//!   ├─► advance clock (busy slice split across active, or idle step)
//!   ├─► dispatch: poll the next occupied slot (round-robin)
//!   │       │
//!   │       ├─ Status(Running)     ──► continue
//!   │       └─ Status(Terminating) ──► publish WorkerTerminating
//!   │                                  join the worker (reap grace)
//!   │                                  release slot, unregister identity
//!   ├─► publish TableReport when the report interval elapsed
//!   └─► launch when due: register mailbox, spawn worker, occupy the
//!       first free slot, publish WorkerLaunched
//!
//!   exit conditions:
//!     - launch target met and no worker active
//!     - run token cancelled (OS signal, wall-clock limit, or caller)
//! }
//!
//! On exit: teardown drains the table (bounded joins, aborts past the
//! grace), publishes SimulationFinished + CleanupComplete, flushes sinks.
//! ```
//!
//! ## Features
//! | Area           | Description                                              | Key types / traits            |
//! |----------------|----------------------------------------------------------|-------------------------------|
//! | **Simulation** | Simulated clock and the scheduling loop.                 | [`Coordinator`], [`SimConfig`], [`SimTime`] |
//! | **Workers**    | Poll-driven process lifetimes with random deadlines.     | [`Identity`], [`Verdict`]     |
//! | **Sink API**   | Hook into run events (logging, capture, custom sinks).   | [`ReportSink`], [`LogWriter`] |
//! | **Events**     | Typed events for everything the run does.                | [`Event`], [`EventKind`]      |
//! | **Errors**     | Typed errors per failure domain.                         | [`SetupError`], [`RuntimeError`] |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use schedsim::{Coordinator, LogWriter, ReportSink, SimConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SimConfig {
//!         target_workers: 2,
//!         worker_time_limit: Duration::from_secs(1),
//!         ..SimConfig::default()
//!     };
//!
//!     // Report to stdout (optional; pass an empty Vec for a silent run)
//!     let sinks: Vec<Arc<dyn ReportSink>> = vec![Arc::new(LogWriter::stdout())];
//!
//!     let coordinator = Coordinator::new(cfg, sinks).await?;
//!     let summary = coordinator.run(CancellationToken::new()).await?;
//!
//!     assert_eq!(summary.launched, 2);
//!     Ok(())
//! }
//! ```
mod channel;
mod clock;
mod config;
mod coordinator;
mod error;
mod events;
mod lifecycle;
mod report;
mod table;
mod worker;

// ---- Public re-exports ----

pub use channel::{Identity, Verdict};
pub use clock::SimTime;
pub use config::SimConfig;
pub use coordinator::{Coordinator, SimSummary};
pub use error::{ChannelError, ProtocolError, RuntimeError, SetupError, WorkerError};
pub use events::{Event, EventKind};
pub use report::{LogWriter, ReportSink, SinkSet};
pub use table::{SlotView, TableSnapshot};
