//! # Core report sink trait
//!
//! `ReportSink` is the extension point for consuming simulation events:
//! logging, trace capture, metrics. Each sink is driven by a dedicated
//! worker loop fed from a bounded queue owned by the
//! [`SinkSet`](crate::SinkSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching); they never block the
//!   coordinator nor other sinks.
//! - Each sink declares its preferred queue capacity via
//!   [`ReportSink::queue_capacity`]. If a queue overflows, events for
//!   that sink are dropped and counted; the total is reported on stderr
//!   when the set shuts down.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for report sinks.
///
/// Called from a sink-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait ReportSink: Send + Sync + 'static {
    /// Handle a single event for this sink.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for warnings).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this sink's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
