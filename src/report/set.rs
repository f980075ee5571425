//! # Delivery lanes between the event bus and the sinks.
//!
//! [`SinkSet`] owns one lane per sink: a bounded queue feeding a worker
//! task that calls the sink. [`SinkSet::emit`] never waits; a lane whose
//! queue is full drops the event and counts the drop, and the totals are
//! reported once, when the set shuts down. A sink that panics loses only
//! the event it was handling; its lane keeps delivering the rest.
//!
//! Queue order is preserved per lane. There is no ordering across lanes;
//! consumers that need a global order sort on [`Event::seq`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::Event;

use super::sink::ReportSink;

/// One sink's delivery lane: its queue, drop counter, and worker.
struct Lane {
    name: &'static str,
    queue: mpsc::Sender<Arc<Event>>,
    dropped: AtomicU64,
    worker: JoinHandle<()>,
}

/// Fan-out stage between the event bus and the registered sinks.
///
/// Built once per run; consumed by [`SinkSet::shutdown`], which drains
/// every lane so the final summary and cleanup lines reach their
/// destination before the process exits.
pub struct SinkSet {
    lanes: Vec<Lane>,
}

impl SinkSet {
    /// Opens a delivery lane per sink and starts its worker.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn ReportSink>>) -> Self {
        let lanes = sinks
            .into_iter()
            .map(|sink| {
                let name = sink.name();
                let (queue, rx) = mpsc::channel(sink.queue_capacity().max(1));
                Lane {
                    name,
                    queue,
                    dropped: AtomicU64::new(0),
                    worker: spawn_lane_worker(name, sink, rx),
                }
            })
            .collect();
        Self { lanes }
    }

    /// Hands one event to every lane without waiting.
    ///
    /// A lane that cannot take the event (queue full) drops it and counts
    /// the drop; the other lanes are unaffected.
    pub fn emit(&self, event: &Event) {
        if self.lanes.is_empty() {
            return;
        }
        let event = Arc::new(event.clone());
        for lane in &self.lanes {
            if lane.queue.try_send(Arc::clone(&event)).is_err() {
                lane.dropped.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }
    }

    /// Closes every lane and waits for its worker to finish the backlog.
    ///
    /// Events already queued are still delivered. A lane that dropped
    /// events reports its total to stderr here, once.
    pub async fn shutdown(self) {
        for lane in self.lanes {
            drop(lane.queue);
            let _ = lane.worker.await;
            let dropped = lane.dropped.into_inner();
            if dropped > 0 {
                eprintln!(
                    "[schedsim] sink '{}' dropped {dropped} event(s) on queue overflow",
                    lane.name
                );
            }
        }
    }
}

/// Feeds one sink from its queue until the lane closes.
fn spawn_lane_worker(
    name: &'static str,
    sink: Arc<dyn ReportSink>,
    mut rx: mpsc::Receiver<Arc<Event>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let delivery = AssertUnwindSafe(sink.on_event(&event)).catch_unwind();
            if delivery.await.is_err() {
                eprintln!(
                    "[schedsim] sink '{name}' panicked; event seq={} lost",
                    event.seq
                );
            }
        }
    })
}
