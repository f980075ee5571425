//! # Worker: one simulated process.
//!
//! A worker draws a random lifetime when it starts, computes its deadline
//! against the simulated clock, and then answers polls until the clock
//! passes that deadline.
//!
//! ## State machine
//! ```text
//! start ──► draw lifetime, deadline = now + lifetime
//!   │
//!   ▼
//! waiting ──► Poll received:
//!   │           now <  deadline ──► reply Status(Running), keep waiting
//!   │           now >= deadline ──► reply Status(Terminating), exit
//!   │
//!   └──► cancelled ──► exit (graceful, no reply owed)
//! ```
//!
//! ## Rules
//! - Exactly **one** status reply per poll, and at most one
//!   `Terminating`; nothing is ever sent after it.
//! - Workers never initiate a message, never touch the process table,
//!   and never write the clock.
//! - The deadline is private; the coordinator learns of it only through
//!   verdicts.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::channel::{Identity, Mailbox, Message, Payload, SyncChannel, Verdict};
use crate::clock::{NANOS_PER_SEC, SimClock};
use crate::error::WorkerError;

/// One simulated process, driven entirely by polls.
pub(crate) struct Worker {
    identity: Identity,
    time_limit: Duration,
    clock: Arc<SimClock>,
    channel: Arc<SyncChannel>,
    mailbox: Mailbox,
}

impl Worker {
    /// Creates a worker around an already-registered mailbox.
    ///
    /// The coordinator registers the mailbox before spawning, so the
    /// first poll can never outrun registration.
    pub fn new(
        identity: Identity,
        time_limit: Duration,
        clock: Arc<SimClock>,
        channel: Arc<SyncChannel>,
        mailbox: Mailbox,
    ) -> Self {
        Self {
            identity,
            time_limit,
            clock,
            channel,
            mailbox,
        }
    }

    /// Runs the worker until its deadline passes or the token cancels.
    ///
    /// The clock is read once at startup; the deadline is fixed from that
    /// snapshot. Cancellation is observed while waiting for a poll, never
    /// between receiving one and replying to it.
    pub async fn run(mut self, token: CancellationToken) -> Result<(), WorkerError> {
        let spawned_at = self.clock.now();
        let lifetime = draw_lifetime(self.time_limit);
        let deadline = spawned_at.saturating_add(lifetime);

        loop {
            let msg = select! {
                _ = token.cancelled() => return Ok(()),
                msg = self.mailbox.recv() => msg?,
            };

            match msg.payload {
                Payload::Poll => {
                    let verdict = if self.clock.now() >= deadline {
                        Verdict::Terminating
                    } else {
                        Verdict::Running
                    };
                    self.channel
                        .send(
                            Identity::COORDINATOR,
                            Message::status(self.identity, verdict),
                        )
                        .await?;
                    if verdict == Verdict::Terminating {
                        return Ok(());
                    }
                }
                Payload::Status(_) => {
                    return Err(WorkerError::UnexpectedMessage { from: msg.from });
                }
            }
        }
    }
}

/// Draws a lifetime of whole seconds uniform in `[1, limit]` (limit
/// truncated to whole seconds, minimum 1) plus a uniform sub-second
/// nanosecond component.
fn draw_lifetime(limit: Duration) -> Duration {
    let mut rng = rand::rng();
    let max_secs = limit.as_secs().max(1);
    let secs = rng.random_range(1..=max_secs);
    let nanos = rng.random_range(0..NANOS_PER_SEC);
    Duration::new(secs, nanos as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use tokio::time;

    const RECV_BOUND: Duration = Duration::from_secs(1);

    struct Rig {
        channel: Arc<SyncChannel>,
        inbox: Mailbox,
        clock: Arc<SimClock>,
        driver: crate::clock::ClockDriver,
    }

    async fn rig() -> Rig {
        let (driver, clock) = SimClock::new();
        let channel = Arc::new(SyncChannel::new());
        let inbox = channel.register(Identity::COORDINATOR).await.unwrap();
        Rig {
            channel,
            inbox,
            clock,
            driver,
        }
    }

    async fn spawn_worker(
        rig: &Rig,
        raw: u32,
        limit: Duration,
        token: &CancellationToken,
    ) -> (
        Identity,
        tokio::task::JoinHandle<Result<(), WorkerError>>,
    ) {
        let identity = Identity::new(raw);
        let mailbox = rig.channel.register(identity).await.unwrap();
        let worker = Worker::new(
            identity,
            limit,
            Arc::clone(&rig.clock),
            Arc::clone(&rig.channel),
            mailbox,
        );
        (identity, tokio::spawn(worker.run(token.clone())))
    }

    async fn poll(rig: &mut Rig, identity: Identity) -> Message {
        rig.channel
            .send(identity, Message::poll(Identity::COORDINATOR))
            .await
            .unwrap();
        time::timeout(RECV_BOUND, rig.inbox.recv())
            .await
            .expect("reply within bound")
            .unwrap()
    }

    #[tokio::test]
    async fn test_replies_running_before_deadline() {
        let mut rig = rig().await;
        let token = CancellationToken::new();
        let (identity, join) =
            spawn_worker(&rig, 1, Duration::from_secs(30), &token).await;

        let reply = poll(&mut rig, identity).await;
        assert_eq!(reply.from, identity);
        assert_eq!(reply.payload, Payload::Status(Verdict::Running));

        token.cancel();
        assert!(join.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_terminates_exactly_once_past_deadline() {
        let mut rig = rig().await;
        let token = CancellationToken::new();
        let (identity, join) =
            spawn_worker(&rig, 1, Duration::from_secs(2), &token).await;

        // Deadline was fixed from the clock at start; prove it by polling
        // before and after a jump far beyond the largest possible draw.
        let reply = poll(&mut rig, identity).await;
        assert_eq!(reply.payload, Payload::Status(Verdict::Running));

        rig.driver.advance(Duration::from_secs(20));
        let reply = poll(&mut rig, identity).await;
        assert_eq!(reply.payload, Payload::Status(Verdict::Terminating));

        assert!(join.await.unwrap().is_ok(), "exits after terminating");
        let err = rig
            .channel
            .send(identity, Message::poll(Identity::COORDINATOR))
            .await
            .err()
            .expect("mailbox owner gone");
        assert!(matches!(err, ChannelError::Disconnected { .. }));
        assert!(
            time::timeout(Duration::from_millis(50), rig.inbox.recv())
                .await
                .is_err(),
            "no reply after the terminating one"
        );
    }

    #[tokio::test]
    async fn test_cancel_exits_cleanly_without_reply() {
        let mut rig = rig().await;
        let token = CancellationToken::new();
        let (_identity, join) =
            spawn_worker(&rig, 1, Duration::from_secs(30), &token).await;

        token.cancel();
        assert!(join.await.unwrap().is_ok());
        assert!(
            time::timeout(Duration::from_millis(50), rig.inbox.recv())
                .await
                .is_err(),
            "cancellation owes no reply"
        );
    }

    #[tokio::test]
    async fn test_rejects_non_poll_message() {
        let rig = rig().await;
        let token = CancellationToken::new();
        let (identity, join) =
            spawn_worker(&rig, 1, Duration::from_secs(30), &token).await;

        let rogue = Identity::new(9);
        rig.channel
            .send(identity, Message::status(rogue, Verdict::Running))
            .await
            .unwrap();

        let err = join.await.unwrap().err().expect("protocol violation");
        assert!(matches!(err, WorkerError::UnexpectedMessage { from } if from == rogue));
    }

    #[test]
    fn test_draw_lifetime_within_bounds() {
        for _ in 0..200 {
            let d = draw_lifetime(Duration::from_millis(4_500));
            assert!(d >= Duration::from_secs(1), "below floor: {d:?}");
            assert!(d < Duration::from_secs(5), "above ceiling: {d:?}");
        }
    }

    #[test]
    fn test_draw_lifetime_clamps_subsecond_limit() {
        for _ in 0..50 {
            let d = draw_lifetime(Duration::from_millis(300));
            assert!(d >= Duration::from_secs(1));
            assert!(d < Duration::from_secs(2));
        }
    }
}
