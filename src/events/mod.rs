//! Simulation events: data model and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the coordinator loop (launch/poll/reap/report), the
//!   watchdog (shutdown requests), and the teardown sweep.
//! - **Consumer**: the coordinator's sink listener, which fans events out
//!   to the configured [`ReportSink`](crate::ReportSink)s.

mod bus;
mod event;

pub use event::{Event, EventKind};

pub(crate) use bus::Bus;
