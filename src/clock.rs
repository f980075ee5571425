//! # Simulated clock shared between the coordinator and workers.
//!
//! Logical time is decoupled from wall time: the coordinator advances the
//! clock in discrete steps, and every other participant only reads it.
//!
//! - [`SimTime`] is the value type: a normalized `(seconds, nanoseconds)`
//!   pair with lexicographic ordering.
//! - [`SimClock`] is the shared read handle backed by a single atomic
//!   counter of total nanoseconds, so a snapshot is one load and never
//!   observes a half-applied advance.
//! - [`ClockDriver`] is the single-writer handle. It is deliberately not
//!   `Clone`: exactly one component may move time forward.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use schedsim::SimTime;
//!
//! let t = SimTime::new(1, 900_000_000).saturating_add(Duration::from_millis(200));
//! assert_eq!(t, SimTime::new(2, 100_000_000));
//! assert!(t > SimTime::new(2, 0));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

/// Nanoseconds per second, the normalization bound for [`SimTime`].
pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point on the simulated timeline.
///
/// Always normalized: `nanos < 1_000_000_000`. Ordering compares seconds
/// first, then nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimTime {
    secs: u64,
    nanos: u32,
}

impl SimTime {
    /// The zero instant, where every simulation starts.
    pub const ZERO: SimTime = SimTime { secs: 0, nanos: 0 };

    /// Creates a normalized instant, carrying surplus nanoseconds into
    /// the seconds component.
    pub fn new(secs: u64, nanos: u64) -> Self {
        Self {
            secs: secs.saturating_add(nanos / NANOS_PER_SEC),
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    /// Reconstructs an instant from a total-nanosecond counter.
    pub fn from_total_nanos(total: u64) -> Self {
        Self {
            secs: total / NANOS_PER_SEC,
            nanos: (total % NANOS_PER_SEC) as u32,
        }
    }

    /// Whole seconds component.
    #[inline]
    pub fn secs(&self) -> u64 {
        self.secs
    }

    /// Sub-second nanoseconds component (always `< 1_000_000_000`).
    #[inline]
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Total nanoseconds since zero, saturating at `u64::MAX`.
    pub fn total_nanos(&self) -> u64 {
        self.secs
            .saturating_mul(NANOS_PER_SEC)
            .saturating_add(u64::from(self.nanos))
    }

    /// Adds a duration, normalizing the carry and saturating the seconds.
    pub fn saturating_add(self, d: Duration) -> Self {
        let nanos = u64::from(self.nanos) + u64::from(d.subsec_nanos());
        Self {
            secs: self
                .secs
                .saturating_add(d.as_secs())
                .saturating_add(nanos / NANOS_PER_SEC),
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.secs, self.nanos)
    }
}

/// Shared logical clock.
///
/// Backed by one `AtomicU64` of total nanoseconds, so readers always see
/// a fully pre- or post-advance value. Workers hold an `Arc<SimClock>`
/// and may only read.
#[derive(Debug)]
pub struct SimClock {
    total: AtomicU64,
}

impl SimClock {
    /// Creates a zeroed clock, returning the single writer and the shared
    /// read handle.
    pub fn new() -> (ClockDriver, Arc<SimClock>) {
        let clock = Arc::new(SimClock {
            total: AtomicU64::new(0),
        });
        (
            ClockDriver {
                clock: Arc::clone(&clock),
            },
            clock,
        )
    }

    /// Current simulated time (one atomic load).
    pub fn now(&self) -> SimTime {
        SimTime::from_total_nanos(self.total.load(AtomicOrdering::Relaxed))
    }
}

/// Write handle for the clock. Owned by the coordinator; not `Clone`.
#[derive(Debug)]
pub struct ClockDriver {
    clock: Arc<SimClock>,
}

impl ClockDriver {
    /// Advances the clock by `step` and returns the post-advance instant.
    pub fn advance(&self, step: Duration) -> SimTime {
        let step = step.as_nanos().min(u128::from(u64::MAX)) as u64;
        let before = self.clock.total.fetch_add(step, AtomicOrdering::Relaxed);
        SimTime::from_total_nanos(before.wrapping_add(step))
    }

    /// Current simulated time, as seen through the shared handle.
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_carry() {
        let t = SimTime::new(1, 1_500_000_000);
        assert_eq!(t, SimTime::new(2, 500_000_000));
        assert_eq!(t.secs(), 2);
        assert_eq!(t.nanos(), 500_000_000);
    }

    #[test]
    fn test_ordering_is_seconds_then_nanos() {
        assert!(SimTime::new(1, 999_999_999) < SimTime::new(2, 0));
        assert!(SimTime::new(2, 1) > SimTime::new(2, 0));
        assert_eq!(SimTime::new(3, 7), SimTime::new(3, 7));
    }

    #[test]
    fn test_saturating_add_carries() {
        let t = SimTime::new(0, 900_000_000).saturating_add(Duration::from_millis(200));
        assert_eq!(t, SimTime::new(1, 100_000_000));
    }

    #[test]
    fn test_total_nanos_round_trip() {
        let t = SimTime::new(4, 123_456_789);
        assert_eq!(SimTime::from_total_nanos(t.total_nanos()), t);
    }

    #[test]
    fn test_driver_advance_accumulates() {
        let (driver, clock) = SimClock::new();
        assert_eq!(clock.now(), SimTime::ZERO);

        let after = driver.advance(Duration::from_millis(10));
        assert_eq!(after, SimTime::new(0, 10_000_000));

        let after = driver.advance(Duration::from_secs(2));
        assert_eq!(after, SimTime::new(2, 10_000_000));
        assert_eq!(clock.now(), after);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let (driver, clock) = SimClock::new();
        let mut prev = clock.now();
        for step in [1u64, 999_999_999, 3, 250_000_000, 10_000_000] {
            let next = driver.advance(Duration::from_nanos(step));
            assert!(next > prev, "clock went backwards: {next} <= {prev}");
            prev = next;
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(SimTime::new(3, 200_000_000).to_string(), "3.200000000s");
        assert_eq!(SimTime::ZERO.to_string(), "0.000000000s");
    }
}
