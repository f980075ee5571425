//! # Shutdown triggers and teardown sweeps.
//!
//! Two concerns live here, both owned by the coordinator:
//!
//! - the **watchdog**, a background task that turns external shutdown
//!   causes (OS signals, the wall-clock limit, caller cancellation) into
//!   one cancellation of the run token;
//! - the **drain sweep**, which empties the process table during
//!   teardown, joining every live worker within a grace period and
//!   aborting the ones that overstay.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::time::Duration;

use tokio::select;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::channel::SyncChannel;
use crate::clock::SimTime;
use crate::events::{Bus, Event, EventKind};
use crate::table::ProcessTable;

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal
/// registration fails.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Resolves on the first shutdown signal; never resolves if listeners
/// cannot be registered (the wall-clock limit still bounds the run).
async fn signal_or_never() {
    if wait_for_shutdown_signal().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sleeps for the wall-clock limit, or forever when there is none.
async fn wall_elapsed(wall: Option<Duration>) {
    match wall {
        Some(limit) => time::sleep(limit).await,
        None => std::future::pending::<()>().await,
    }
}

/// Spawns the watchdog that cancels `run` on the first shutdown cause.
///
/// Causes are an OS signal, the wall-clock limit, or `run` being
/// cancelled by the caller; each publishes one [`EventKind::ShutdownRequested`]
/// naming the cause. Cancelling `stop` retires the watchdog silently once
/// the run is already over.
pub(crate) fn spawn_watchdog(
    bus: Bus,
    run: CancellationToken,
    stop: CancellationToken,
    wall: Option<Duration>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let cause = select! {
            _ = stop.cancelled() => return,
            _ = run.cancelled() => "run cancelled",
            _ = signal_or_never() => "signal received",
            _ = wall_elapsed(wall) => "wall clock limit exceeded",
        };
        bus.publish(Event::new(EventKind::ShutdownRequested).with_reason(cause));
        run.cancel();
    })
}

/// Empties the process table, joining every live worker.
///
/// Workers were already told to stop (their cancellation token fired);
/// this sweep waits up to `grace` per worker for the task to finish,
/// aborts the ones that do not, and unregisters every swept identity.
/// Vacant slots are skipped. Returns how many workers had to be aborted.
pub(crate) async fn drain_workers(
    table: &mut ProcessTable,
    channel: &SyncChannel,
    bus: &Bus,
    sim: SimTime,
    grace: Duration,
) -> usize {
    let mut forced = 0;
    for index in 0..table.capacity() {
        let Some(mut entry) = table.take(index) else {
            continue;
        };
        match time::timeout(grace, &mut entry.join).await {
            Ok(Ok(Ok(()))) => {
                bus.publish(
                    Event::new(EventKind::WorkerReaped)
                        .with_identity(entry.identity)
                        .with_slot(index)
                        .with_sim(sim),
                );
            }
            Ok(Ok(Err(err))) => {
                bus.publish(
                    Event::new(EventKind::WorkerFailed)
                        .with_identity(entry.identity)
                        .with_reason(err.to_string()),
                );
            }
            Ok(Err(_)) => {
                bus.publish(
                    Event::new(EventKind::WorkerFailed)
                        .with_identity(entry.identity)
                        .with_reason("worker panicked"),
                );
            }
            Err(_) => {
                entry.join.abort();
                let _ = (&mut entry.join).await;
                forced += 1;
                bus.publish(
                    Event::new(EventKind::WorkerForced)
                        .with_identity(entry.identity)
                        .with_reason("shutdown grace exceeded"),
                );
            }
        }
        channel.unregister(entry.identity).await;
    }
    forced
}
