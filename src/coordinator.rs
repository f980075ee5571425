//! # Coordinator: the scheduling engine.
//!
//! [`Coordinator::run`] owns the whole simulation. Each pass of its loop:
//!
//! 1. advances the simulated clock (small idle step, or a busy slice
//!    divided across the active workers),
//! 2. polls the next occupied slot in round-robin order and handles the
//!    reply (a terminating worker is reaped and its slot released),
//! 3. publishes the periodic table report when one is due,
//! 4. launches a new worker when the schedule, the concurrency cap, and
//!    a free slot all allow it.
//!
//! The loop exits once the launch target is met and the table is empty,
//! or when the run token is cancelled. Either way teardown runs: every
//! remaining worker is drained, the table and channel are emptied, and
//! the final summary is published before the sinks are flushed.
//!
//! ## Rules
//! - Exactly one outstanding poll at a time; a reply that fails to
//!   arrive within the reply grace is fatal.
//! - Workers that promised to terminate are joined within the reap
//!   grace; overstaying is fatal mid-run and a forced abort during
//!   teardown.
//! - Cancellation is not an error: a cancelled run still returns its
//!   summary after draining.

use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::channel::{Identity, Mailbox, Message, Payload, SyncChannel, Verdict};
use crate::clock::{ClockDriver, SimClock, SimTime};
use crate::config::SimConfig;
use crate::error::{ProtocolError, RuntimeError, SetupError};
use crate::events::{Bus, Event, EventKind};
use crate::lifecycle::{drain_workers, spawn_watchdog};
use crate::report::{ReportSink, SinkSet};
use crate::table::{ProcessEntry, ProcessTable};
use crate::worker::Worker;

/// Final account of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimSummary {
    /// Workers launched over the whole run.
    pub launched: usize,
    /// Completed poll/reply cycles.
    pub cycles: u64,
    /// Simulated time at which the run ended.
    pub sim_time: SimTime,
}

/// The scheduling engine.
///
/// Owns the clock driver, the process table, the synchronization channel,
/// and the event bus. Built idle by [`Coordinator::new`]; consumed by
/// [`Coordinator::run`].
pub struct Coordinator {
    cfg: SimConfig,
    bus: Bus,
    sinks: Arc<SinkSet>,
    channel: Arc<SyncChannel>,
    clock: Arc<SimClock>,
    driver: ClockDriver,
    table: ProcessTable,
    inbox: Mailbox,
    worker_token: CancellationToken,

    next_identity: u32,
    total_launched: usize,
    active: usize,
    cycles: u64,
    next_launch_at: SimTime,
    cursor: usize,
    last_report_at: SimTime,
    torn_down: bool,
}

impl Coordinator {
    /// Validates the configuration, claims the coordinator address on a
    /// fresh channel, and prepares an idle engine.
    ///
    /// Nothing runs until [`Coordinator::run`]; the clock stays at zero.
    pub async fn new(
        cfg: SimConfig,
        sinks: Vec<Arc<dyn ReportSink>>,
    ) -> Result<Self, SetupError> {
        cfg.validate()?;

        let (driver, clock) = SimClock::new();
        let channel = Arc::new(SyncChannel::new());
        let inbox = channel.register(Identity::COORDINATOR).await?;
        let bus = Bus::new(cfg.bus_capacity);
        let sinks = Arc::new(SinkSet::new(sinks));
        let table = ProcessTable::new(cfg.table_capacity);
        // Round-robin starts at slot 0: the cursor points at the slot
        // before it and dispatch advances first.
        let cursor = table.capacity() - 1;

        Ok(Self {
            cfg,
            bus,
            sinks,
            channel,
            clock,
            driver,
            table,
            inbox,
            worker_token: CancellationToken::new(),
            next_identity: 1,
            total_launched: 0,
            active: 0,
            cycles: 0,
            next_launch_at: SimTime::ZERO,
            cursor,
            last_report_at: SimTime::ZERO,
            torn_down: false,
        })
    }

    /// Runs the simulation to completion or cancellation.
    ///
    /// Cancelling `token` requests shutdown: the loop stops, live workers
    /// are drained, and the summary is still returned. The error cases
    /// are internal invariant violations and worker failures; teardown
    /// runs for those too.
    pub async fn run(mut self, token: CancellationToken) -> Result<SimSummary, RuntimeError> {
        let listener = Self::spawn_sink_listener(&self.bus, Arc::clone(&self.sinks));
        let watchdog_stop = CancellationToken::new();
        let watchdog = spawn_watchdog(
            self.bus.clone(),
            token.clone(),
            watchdog_stop.clone(),
            self.cfg.wall_timeout,
        );

        self.bus.publish(
            Event::new(EventKind::SimulationStarted)
                .with_sim(self.clock.now())
                .with_reason(self.cfg.describe()),
        );

        let outcome = self.run_loop(&token).await;

        self.shutdown().await;

        let summary = self.summary();
        self.bus.publish(
            Event::new(EventKind::SimulationFinished)
                .with_sim(summary.sim_time)
                .with_summary(summary),
        );
        self.bus.publish(Event::new(EventKind::CleanupComplete));

        watchdog_stop.cancel();
        let _ = watchdog.await;

        // Dropping the bus closes the broadcast channel; the listener
        // drains what was published and exits, after which the sink set
        // can be reclaimed and flushed.
        let Coordinator { bus, sinks, .. } = self;
        drop(bus);
        let _ = listener.await;
        if let Ok(set) = Arc::try_unwrap(sinks) {
            set.shutdown().await;
        }

        outcome.map(|_| summary)
    }

    async fn run_loop(&mut self, token: &CancellationToken) -> Result<(), RuntimeError> {
        loop {
            if token.is_cancelled() {
                return Ok(());
            }
            if self.total_launched >= self.cfg.target_workers && self.active == 0 {
                return Ok(());
            }

            self.advance_clock();

            if self.active > 0 {
                self.dispatch_next_poll(token).await?;
            }
            self.report_if_due();
            self.try_launch(token).await?;

            // With nothing to poll the loop is pure bookkeeping; yield so
            // the watchdog and sinks get scheduled.
            if self.active == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    /// Advances the simulated clock by one step.
    ///
    /// Idle steps are fixed; busy steps split the configured slice across
    /// the active workers so simulated time scales with load.
    fn advance_clock(&mut self) {
        let step = if self.active > 0 {
            (self.cfg.busy_slice / self.active as u32).max(Duration::from_nanos(1))
        } else {
            self.cfg.idle_step
        };
        self.driver.advance(step);
    }

    /// Polls the next occupied slot after the cursor and handles its reply.
    ///
    /// Callers guarantee at least one worker is active. The reply must
    /// come from the polled worker within the reply grace; a worker that
    /// answers `Terminating` is reaped before the next dispatch.
    async fn dispatch_next_poll(
        &mut self,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        let index = self
            .table
            .next_occupied_after(self.cursor)
            .ok_or(ProtocolError::EmptyDispatch)?;
        self.cursor = index;
        let identity = match self.table.entry(index) {
            Some(entry) => entry.identity,
            None => return Err(ProtocolError::SlotVacant { index }.into()),
        };

        self.channel
            .send(identity, Message::poll(Identity::COORDINATOR))
            .await?;

        let reply = select! {
            _ = token.cancelled() => return Ok(()),
            reply = time::timeout(self.cfg.reply_grace, self.inbox.recv()) => {
                reply.map_err(|_| RuntimeError::ReplyTimeout {
                    identity,
                    grace: self.cfg.reply_grace,
                })??
            }
        };

        if reply.from != identity {
            return Err(ProtocolError::UnexpectedReply {
                expected: identity,
                got: reply.from,
            }
            .into());
        }
        let verdict = match reply.payload {
            Payload::Status(verdict) => verdict,
            Payload::Poll => {
                return Err(ProtocolError::MalformedReply { from: reply.from }.into());
            }
        };

        self.cycles += 1;
        let polls = match self.table.entry_mut(index) {
            Some(entry) => {
                entry.polls += 1;
                entry.polls
            }
            None => return Err(ProtocolError::SlotVacant { index }.into()),
        };

        if verdict == Verdict::Terminating {
            self.bus.publish(
                Event::new(EventKind::WorkerTerminating)
                    .with_identity(identity)
                    .with_slot(index)
                    .with_sim(self.clock.now())
                    .with_polls(polls),
            );
            self.reap(index).await?;
        }
        Ok(())
    }

    /// Joins the worker at `index` and releases its slot.
    ///
    /// Called only after the worker promised to terminate, so the join is
    /// bounded by the reap grace. The slot is released and the identity
    /// unregistered no matter how the join resolves.
    async fn reap(&mut self, index: usize) -> Result<(), RuntimeError> {
        let grace = self.cfg.reap_grace;
        let joined = {
            let entry = self
                .table
                .entry_mut(index)
                .ok_or(ProtocolError::SlotVacant { index })?;
            time::timeout(grace, &mut entry.join).await
        };

        let mut entry = self.table.release(index)?;
        self.active -= 1;
        self.channel.unregister(entry.identity).await;

        match joined {
            Ok(Ok(Ok(()))) => {
                self.bus.publish(
                    Event::new(EventKind::WorkerReaped)
                        .with_identity(entry.identity)
                        .with_slot(index)
                        .with_sim(self.clock.now()),
                );
                Ok(())
            }
            Ok(Ok(Err(err))) => {
                self.bus.publish(
                    Event::new(EventKind::WorkerFailed)
                        .with_identity(entry.identity)
                        .with_reason(err.to_string()),
                );
                Err(RuntimeError::Worker {
                    identity: entry.identity,
                    source: err,
                })
            }
            Ok(Err(_)) => {
                self.bus.publish(
                    Event::new(EventKind::WorkerFailed)
                        .with_identity(entry.identity)
                        .with_reason("worker panicked"),
                );
                Err(RuntimeError::WorkerPanicked {
                    identity: entry.identity,
                })
            }
            Err(_) => {
                entry.join.abort();
                let _ = (&mut entry.join).await;
                self.bus.publish(
                    Event::new(EventKind::WorkerForced)
                        .with_identity(entry.identity)
                        .with_reason("reap grace exceeded"),
                );
                Err(RuntimeError::ReapTimeout {
                    identity: entry.identity,
                    grace,
                })
            }
        }
    }

    /// Publishes a table report if the report interval elapsed.
    fn report_if_due(&mut self) {
        let now = self.clock.now();
        let elapsed = now
            .total_nanos()
            .saturating_sub(self.last_report_at.total_nanos());
        if elapsed < self.cfg.report_interval.as_nanos() as u64 {
            return;
        }
        self.last_report_at = now;
        self.bus.publish(
            Event::new(EventKind::TableReport)
                .with_sim(now)
                .with_table(self.table.snapshot()),
        );
    }

    /// Launches one worker when everything lines up.
    ///
    /// A launch happens when the target is not yet met, fewer than the
    /// concurrency cap are active, the launch schedule is due, and the
    /// table has a free slot. A full table stalls the schedule rather
    /// than failing; the launch fires as soon as a slot frees.
    async fn try_launch(&mut self, token: &CancellationToken) -> Result<(), RuntimeError> {
        if token.is_cancelled()
            || self.total_launched >= self.cfg.target_workers
            || self.active >= self.cfg.max_concurrent
        {
            return Ok(());
        }
        let now = self.clock.now();
        if now < self.next_launch_at {
            return Ok(());
        }
        let Some(index) = self.table.find_free() else {
            return Ok(());
        };

        let identity = Identity::new(self.next_identity);
        self.next_identity += 1;

        // Register before spawning so the first poll cannot outrun the
        // worker's mailbox.
        let mailbox = self.channel.register(identity).await?;
        let worker = Worker::new(
            identity,
            self.cfg.worker_time_limit,
            Arc::clone(&self.clock),
            Arc::clone(&self.channel),
            mailbox,
        );
        let join = tokio::spawn(worker.run(self.worker_token.child_token()));

        self.table.occupy(
            index,
            ProcessEntry {
                identity,
                started_at: now,
                polls: 0,
                join,
            },
        )?;
        self.total_launched += 1;
        self.active += 1;
        self.next_launch_at = now.saturating_add(self.cfg.launch_interval);

        self.bus.publish(
            Event::new(EventKind::WorkerLaunched)
                .with_identity(identity)
                .with_slot(index)
                .with_sim(now),
        );
        Ok(())
    }

    /// Tears the run down. Safe to call more than once; only the first
    /// call does anything.
    ///
    /// Cancels every worker, drains the table (joining within the reap
    /// grace, aborting past it), and releases the coordinator's own
    /// channel address.
    async fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.worker_token.cancel();
        drain_workers(
            &mut self.table,
            &self.channel,
            &self.bus,
            self.clock.now(),
            self.cfg.reap_grace,
        )
        .await;
        self.active = 0;
        self.channel.unregister(Identity::COORDINATOR).await;
    }

    fn summary(&self) -> SimSummary {
        SimSummary {
            launched: self.total_launched,
            cycles: self.cycles,
            sim_time: self.clock.now(),
        }
    }

    /// Spawns the task that forwards bus events to the sink set.
    ///
    /// Subscribes before spawning so no event published after this call
    /// can be missed.
    fn spawn_sink_listener(bus: &Bus, sinks: Arc<SinkSet>) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => sinks.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Sink that records every event for post-run assertions.
    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl ReportSink for CollectingSink {
        async fn on_event(&self, event: &Event) {
            self.events.lock().unwrap().push(event.clone());
        }

        fn name(&self) -> &'static str {
            "CollectingSink"
        }
    }

    impl CollectingSink {
        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    fn base_cfg() -> SimConfig {
        SimConfig {
            wall_timeout: None,
            ..SimConfig::default()
        }
    }

    fn of_kind(events: &[Event], kind: EventKind) -> Vec<Event> {
        events
            .iter()
            .filter(|ev| ev.kind == kind)
            .cloned()
            .collect()
    }

    async fn run_to_end(cfg: SimConfig) -> (SimSummary, Vec<Event>) {
        let sink = Arc::new(CollectingSink::default());
        let coordinator = Coordinator::new(cfg, vec![sink.clone() as Arc<dyn ReportSink>])
            .await
            .unwrap();
        let summary = coordinator
            .run(CancellationToken::new())
            .await
            .expect("run succeeds");
        (summary, sink.take())
    }

    #[tokio::test]
    async fn test_zero_target_finishes_immediately() {
        let cfg = SimConfig {
            target_workers: 0,
            ..base_cfg()
        };
        let (summary, events) = run_to_end(cfg).await;

        assert_eq!(summary.launched, 0);
        assert_eq!(summary.cycles, 0);
        assert_eq!(summary.sim_time, SimTime::ZERO, "clock never advanced");

        let kinds: Vec<EventKind> = events.iter().map(|ev| ev.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::SimulationStarted,
                EventKind::SimulationFinished,
                EventKind::CleanupComplete,
            ]
        );
        let finished = &events[1];
        assert_eq!(finished.summary, Some(summary));
    }

    #[tokio::test]
    async fn test_all_workers_launched_and_reaped() {
        let cfg = SimConfig {
            target_workers: 4,
            max_concurrent: 2,
            worker_time_limit: Duration::from_secs(1),
            launch_interval: Duration::ZERO,
            ..base_cfg()
        };
        let (summary, events) = run_to_end(cfg).await;

        assert_eq!(summary.launched, 4);
        assert!(summary.cycles >= 4, "every worker answered at least once");

        let launched = of_kind(&events, EventKind::WorkerLaunched);
        let reaped = of_kind(&events, EventKind::WorkerReaped);
        assert_eq!(launched.len(), 4);
        assert_eq!(reaped.len(), 4, "every launch has a matching reap");
        assert!(of_kind(&events, EventKind::WorkerForced).is_empty());
        assert!(of_kind(&events, EventKind::WorkerFailed).is_empty());

        // Identities are allocated monotonically from 1.
        let ids: Vec<Identity> = launched.iter().filter_map(|ev| ev.identity).collect();
        assert_eq!(
            ids,
            vec![
                Identity::new(1),
                Identity::new(2),
                Identity::new(3),
                Identity::new(4)
            ]
        );
    }

    #[tokio::test]
    async fn test_sequential_when_concurrency_is_one() {
        let cfg = SimConfig {
            target_workers: 3,
            max_concurrent: 1,
            worker_time_limit: Duration::from_secs(1),
            launch_interval: Duration::ZERO,
            ..base_cfg()
        };
        let (summary, events) = run_to_end(cfg).await;
        assert_eq!(summary.launched, 3);

        let launched = of_kind(&events, EventKind::WorkerLaunched);
        let reaped = of_kind(&events, EventKind::WorkerReaped);
        for i in 0..2 {
            assert!(
                reaped[i].seq < launched[i + 1].seq,
                "worker {} must be reaped before worker {} launches",
                i + 1,
                i + 2
            );
        }
    }

    #[tokio::test]
    async fn test_full_table_stalls_launches() {
        let cfg = SimConfig {
            target_workers: 5,
            max_concurrent: 5,
            table_capacity: 2,
            worker_time_limit: Duration::from_secs(1),
            launch_interval: Duration::ZERO,
            ..base_cfg()
        };
        let (summary, events) = run_to_end(cfg).await;
        assert_eq!(summary.launched, 5);

        let mut occupied: i64 = 0;
        for ev in &events {
            match ev.kind {
                EventKind::WorkerLaunched => occupied += 1,
                EventKind::WorkerReaped | EventKind::WorkerForced => occupied -= 1,
                _ => {}
            }
            assert!(occupied <= 2, "table capacity exceeded at seq {}", ev.seq);
        }
        assert_eq!(occupied, 0, "teardown left entries behind");
    }

    #[tokio::test]
    async fn test_cancellation_drains_active_workers() {
        // Near-frozen clock keeps both workers far from their deadlines.
        let cfg = SimConfig {
            target_workers: 2,
            max_concurrent: 2,
            worker_time_limit: Duration::from_secs(1000),
            launch_interval: Duration::ZERO,
            busy_slice: Duration::from_nanos(1),
            ..base_cfg()
        };
        let sink = Arc::new(CollectingSink::default());
        let coordinator =
            Coordinator::new(cfg, vec![sink.clone() as Arc<dyn ReportSink>])
                .await
                .unwrap();

        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            async move {
                time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            }
        };
        let (outcome, ()) = tokio::join!(coordinator.run(token.clone()), canceller);
        let summary = outcome.expect("cancelled run still succeeds");
        assert_eq!(summary.launched, 2);

        let events = sink.take();
        let shutdown = of_kind(&events, EventKind::ShutdownRequested);
        assert_eq!(shutdown.len(), 1);
        assert_eq!(shutdown[0].reason.as_deref(), Some("run cancelled"));

        let mut launched: Vec<Identity> = of_kind(&events, EventKind::WorkerLaunched)
            .iter()
            .filter_map(|ev| ev.identity)
            .collect();
        let mut swept: Vec<Identity> = events
            .iter()
            .filter(|ev| {
                matches!(
                    ev.kind,
                    EventKind::WorkerReaped | EventKind::WorkerForced
                )
            })
            .filter_map(|ev| ev.identity)
            .collect();
        launched.sort();
        swept.sort();
        assert_eq!(launched, swept, "every launched worker was drained");
    }

    #[tokio::test]
    async fn test_wall_limit_requests_shutdown() {
        let cfg = SimConfig {
            target_workers: 1,
            worker_time_limit: Duration::from_secs(1000),
            launch_interval: Duration::ZERO,
            busy_slice: Duration::from_nanos(1),
            wall_timeout: Some(Duration::from_millis(100)),
            ..SimConfig::default()
        };
        let (summary, events) = {
            let sink = Arc::new(CollectingSink::default());
            let coordinator =
                Coordinator::new(cfg, vec![sink.clone() as Arc<dyn ReportSink>])
                    .await
                    .unwrap();
            let summary = coordinator
                .run(CancellationToken::new())
                .await
                .expect("wall limit is not an error");
            (summary, sink.take())
        };
        assert_eq!(summary.launched, 1);

        let shutdown = of_kind(&events, EventKind::ShutdownRequested);
        assert_eq!(shutdown.len(), 1);
        assert_eq!(
            shutdown[0].reason.as_deref(),
            Some("wall clock limit exceeded")
        );
    }

    #[tokio::test]
    async fn test_table_reports_appear_on_schedule() {
        let cfg = SimConfig {
            target_workers: 2,
            max_concurrent: 2,
            worker_time_limit: Duration::from_secs(2),
            launch_interval: Duration::ZERO,
            report_interval: Duration::from_millis(500),
            ..base_cfg()
        };
        let (_summary, events) = run_to_end(cfg).await;

        let reports = of_kind(&events, EventKind::TableReport);
        assert!(!reports.is_empty(), "a multi-second run reports at least once");
        for report in &reports {
            let snapshot = report.table.as_ref().expect("report carries a snapshot");
            assert!(snapshot.occupied() <= 2);
        }
        // Reports are at least the configured interval apart in sim time.
        for pair in reports.windows(2) {
            let a = pair[0].sim.expect("report carries sim time");
            let b = pair[1].sim.expect("report carries sim time");
            assert!(
                b.total_nanos() - a.total_nanos() >= 500_000_000,
                "reports closer than the interval"
            );
        }
    }

    #[tokio::test]
    async fn test_round_robin_spreads_polls_evenly() {
        let cfg = SimConfig {
            target_workers: 3,
            max_concurrent: 3,
            worker_time_limit: Duration::from_secs(1000),
            launch_interval: Duration::ZERO,
            ..base_cfg()
        };
        let mut coordinator = Coordinator::new(cfg, Vec::new()).await.unwrap();
        let token = CancellationToken::new();

        for _ in 0..3 {
            coordinator.try_launch(&token).await.unwrap();
        }
        assert_eq!(coordinator.active, 3);

        for _ in 0..6 {
            coordinator.dispatch_next_poll(&token).await.unwrap();
        }
        assert_eq!(coordinator.cycles, 6);
        for index in 0..3 {
            let entry = coordinator.table.entry(index).expect("occupied");
            assert_eq!(entry.polls, 2, "slot {index} polled unevenly");
        }

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_rejects_reply_from_wrong_worker() {
        let cfg = SimConfig {
            target_workers: 0,
            reap_grace: Duration::from_millis(20),
            ..base_cfg()
        };
        let mut coordinator = Coordinator::new(cfg, Vec::new()).await.unwrap();

        // A slot whose occupant never reads its mailbox, plus a rogue
        // status already waiting in the coordinator's inbox.
        let identity = Identity::new(1);
        let _mailbox = coordinator.channel.register(identity).await.unwrap();
        coordinator
            .table
            .occupy(
                0,
                ProcessEntry {
                    identity,
                    started_at: SimTime::ZERO,
                    polls: 0,
                    join: tokio::spawn(async {
                        std::future::pending::<()>().await;
                        Ok(())
                    }),
                },
            )
            .unwrap();
        coordinator.active = 1;

        let rogue = Identity::new(9);
        coordinator
            .channel
            .send(
                Identity::COORDINATOR,
                Message::status(rogue, Verdict::Running),
            )
            .await
            .unwrap();

        let token = CancellationToken::new();
        let err = coordinator
            .dispatch_next_poll(&token)
            .await
            .err()
            .expect("wrong sender is fatal");
        assert!(matches!(
            err,
            RuntimeError::Protocol(ProtocolError::UnexpectedReply { expected, got })
                if expected == identity && got == rogue
        ));

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_dispatch_times_out_without_reply() {
        let cfg = SimConfig {
            target_workers: 0,
            reply_grace: Duration::from_millis(20),
            reap_grace: Duration::from_millis(20),
            ..base_cfg()
        };
        let mut coordinator = Coordinator::new(cfg, Vec::new()).await.unwrap();

        let identity = Identity::new(1);
        let _mailbox = coordinator.channel.register(identity).await.unwrap();
        coordinator
            .table
            .occupy(
                0,
                ProcessEntry {
                    identity,
                    started_at: SimTime::ZERO,
                    polls: 0,
                    join: tokio::spawn(async {
                        std::future::pending::<()>().await;
                        Ok(())
                    }),
                },
            )
            .unwrap();
        coordinator.active = 1;

        let token = CancellationToken::new();
        let err = coordinator
            .dispatch_next_poll(&token)
            .await
            .err()
            .expect("silent worker is fatal");
        assert!(matches!(err, RuntimeError::ReplyTimeout { .. }));

        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let cfg = SimConfig {
            target_workers: 0,
            ..base_cfg()
        };
        let mut coordinator = Coordinator::new(cfg, Vec::new()).await.unwrap();

        coordinator.shutdown().await;
        assert!(
            !coordinator
                .channel
                .is_registered(Identity::COORDINATOR)
                .await
        );
        coordinator.shutdown().await;
        assert!(coordinator.torn_down);
    }
}
