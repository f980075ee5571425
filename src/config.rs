//! # Simulation configuration.
//!
//! [`SimConfig`] centralizes every knob of a run: the worker population,
//! the clock stepping policy, reporting cadence, and the wall-clock
//! grace bounds that keep blocking operations from hanging a shutdown.
//!
//! Simulated durations (`worker_time_limit`, `launch_interval`,
//! `idle_step`, `busy_slice`, `report_interval`) are measured on the
//! logical clock; grace periods and the watchdog are wall-clock.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use schedsim::SimConfig;
//!
//! let mut cfg = SimConfig::default();
//! cfg.target_workers = 10;
//! cfg.worker_time_limit = Duration::from_secs(2);
//!
//! assert!(cfg.validate().is_ok());
//! ```

use std::time::Duration;

use crate::error::SetupError;

/// Configuration of one simulation run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Total number of workers to launch over the run.
    ///
    /// Zero is valid: the run finishes immediately with an empty summary.
    pub target_workers: usize,

    /// Maximum number of workers alive at once.
    pub max_concurrent: usize,

    /// Upper bound on a worker's drawn lifetime.
    ///
    /// A worker draws whole seconds uniformly from 1 to this bound
    /// (truncated to whole seconds, minimum 1) plus a uniform sub-second
    /// component.
    pub worker_time_limit: Duration,

    /// Minimum simulated time between consecutive launches.
    pub launch_interval: Duration,

    /// Number of process-table slots. Launches stall silently while the
    /// table is full.
    pub table_capacity: usize,

    /// Clock step per iteration while no workers are active.
    pub idle_step: Duration,

    /// Clock budget per iteration while workers are active; the step is
    /// this slice divided by the active count.
    pub busy_slice: Duration,

    /// Simulated interval between process-table reports.
    pub report_interval: Duration,

    /// Wall-clock bound on waiting for a poll reply. Expiry is fatal.
    pub reply_grace: Duration,

    /// Wall-clock bound on joining a worker before aborting it.
    pub reap_grace: Duration,

    /// Optional wall-clock limit on the whole run (`None` = unlimited).
    /// When it trips, the watchdog requests shutdown and the run drains.
    pub wall_timeout: Option<Duration>,

    /// Capacity of the event bus broadcast channel (minimum 1).
    pub bus_capacity: usize,
}

impl SimConfig {
    /// Checks the configuration for values the run cannot operate with.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.max_concurrent == 0 {
            return Err(invalid("max_concurrent must be at least 1"));
        }
        if self.table_capacity == 0 {
            return Err(invalid("table_capacity must be at least 1"));
        }
        if self.idle_step.is_zero() {
            return Err(invalid("idle_step must be positive"));
        }
        if self.busy_slice.is_zero() {
            return Err(invalid("busy_slice must be positive"));
        }
        if self.report_interval.is_zero() {
            return Err(invalid("report_interval must be positive"));
        }
        if self.reply_grace.is_zero() {
            return Err(invalid("reply_grace must be positive"));
        }
        if self.reap_grace.is_zero() {
            return Err(invalid("reap_grace must be positive"));
        }
        Ok(())
    }

    /// One-line summary of the launch parameters, echoed at startup.
    pub fn describe(&self) -> String {
        format!(
            "target={} concurrent={} limit={:?} interval={:?} capacity={}",
            self.target_workers,
            self.max_concurrent,
            self.worker_time_limit,
            self.launch_interval,
            self.table_capacity,
        )
    }
}

fn invalid(reason: &str) -> SetupError {
    SetupError::InvalidConfig {
        reason: reason.to_string(),
    }
}

impl Default for SimConfig {
    /// Default configuration:
    ///
    /// - `target_workers = 5`
    /// - `max_concurrent = 3`
    /// - `worker_time_limit = 4.5s`
    /// - `launch_interval = 200ms`
    /// - `table_capacity = 20`
    /// - `idle_step = 10ms`, `busy_slice = 250ms`
    /// - `report_interval = 500ms` (simulated)
    /// - `reply_grace = reap_grace = 5s` (wall)
    /// - `wall_timeout = 60s` (wall)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            target_workers: 5,
            max_concurrent: 3,
            worker_time_limit: Duration::from_millis(4_500),
            launch_interval: Duration::from_millis(200),
            table_capacity: 20,
            idle_step: Duration::from_millis(10),
            busy_slice: Duration::from_millis(250),
            report_interval: Duration::from_millis(500),
            reply_grace: Duration::from_secs(5),
            reap_grace: Duration::from_secs(5),
            wall_timeout: Some(Duration::from_secs(60)),
            bus_capacity: 1024,
        }
    }
}
