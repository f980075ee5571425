//! Error types used by the scheduler simulation.
//!
//! The taxonomy separates failures by who is at fault and when:
//!
//! - [`SetupError`]: initialization failed; nothing was started.
//! - [`ChannelError`]: the synchronization channel refused an operation.
//! - [`ProtocolError`]: an internal invariant of the table or the
//!   poll/reply protocol was violated (a bug, always fatal).
//! - [`WorkerError`]: a worker task ended abnormally.
//! - [`RuntimeError`]: the top-level fatal type returned by
//!   [`Coordinator::run`](crate::Coordinator::run).
//!
//! Cancellation is deliberately **not** an error: a cancelled run drains
//! its workers and still returns a summary.

use std::time::Duration;

use thiserror::Error;

use crate::channel::Identity;

/// # Errors raised before the simulation loop starts.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SetupError {
    /// The configuration failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was rejected and why.
        reason: String,
    },

    /// Claiming a well-known channel address failed (already taken).
    #[error("channel setup failed: {0}")]
    Channel(#[from] ChannelError),
}

/// # Errors raised by the synchronization channel.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A mailbox for this identity already exists.
    #[error("identity {identity} is already registered")]
    AlreadyRegistered {
        /// The colliding address.
        identity: Identity,
    },

    /// No mailbox is registered for the addressed identity.
    #[error("no mailbox registered for identity {identity}")]
    UnknownRecipient {
        /// The unroutable address.
        identity: Identity,
    },

    /// The route exists but its mailbox owner is gone.
    #[error("mailbox owner for identity {identity} is gone")]
    Disconnected {
        /// The unreachable address.
        identity: Identity,
    },

    /// The mailbox was unregistered while its owner still waited on it.
    #[error("channel closed for identity {identity}")]
    Closed {
        /// The owning address.
        identity: Identity,
    },
}

/// # Violations of table or poll/reply invariants.
///
/// These indicate bugs in the scheduling engine itself, never bad input,
/// and abort the run.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Attempt to occupy a slot that already holds a live entry.
    #[error("slot {index} is already occupied")]
    SlotOccupied {
        /// The slot in question.
        index: usize,
    },

    /// Attempt to release or poll a slot that holds nothing.
    #[error("slot {index} is vacant")]
    SlotVacant {
        /// The slot in question.
        index: usize,
    },

    /// A slot index beyond the table capacity.
    #[error("slot index {index} out of range")]
    SlotOutOfRange {
        /// The offending index.
        index: usize,
    },

    /// Dispatch found no occupied slot while workers were counted active.
    #[error("no occupied slot to dispatch while workers are active")]
    EmptyDispatch,

    /// A reply arrived from a different worker than the one polled.
    #[error("reply from {got}, expected {expected}")]
    UnexpectedReply {
        /// The worker that was polled.
        expected: Identity,
        /// The worker that answered.
        got: Identity,
    },

    /// A reply that was not a status message.
    #[error("malformed reply from {from}")]
    MalformedReply {
        /// The sender of the malformed message.
        from: Identity,
    },
}

/// # Errors produced by worker task execution.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The channel failed underneath the worker (receive or reply).
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The worker received something other than a poll.
    #[error("unexpected message from {from}")]
    UnexpectedMessage {
        /// The sender of the unexpected message.
        from: Identity,
    },
}

/// # Fatal errors returned by the coordinator run.
///
/// Any of these triggers the full teardown sequence before the error is
/// handed back to the caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An internal invariant was violated.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The synchronization channel failed mid-run.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A worker task resolved with an error.
    #[error("worker {identity} failed: {source}")]
    Worker {
        /// The failing worker.
        identity: Identity,
        /// What it reported.
        #[source]
        source: WorkerError,
    },

    /// A worker task panicked.
    #[error("worker {identity} panicked")]
    WorkerPanicked {
        /// The panicking worker.
        identity: Identity,
    },

    /// A polled worker did not answer within the reply grace period.
    #[error("no reply from worker {identity} within {grace:?}")]
    ReplyTimeout {
        /// The unresponsive worker.
        identity: Identity,
        /// The wall-clock bound that expired.
        grace: Duration,
    },

    /// A worker that promised to exit did not do so within the reap
    /// grace period and had to be aborted.
    #[error("worker {identity} did not exit within {grace:?}; aborted")]
    ReapTimeout {
        /// The stuck worker.
        identity: Identity,
        /// The wall-clock bound that expired.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use schedsim::{Identity, RuntimeError};
    ///
    /// let err = RuntimeError::ReplyTimeout {
    ///     identity: Identity::new(7),
    ///     grace: Duration::from_secs(5),
    /// };
    /// assert_eq!(err.as_label(), "reply_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Protocol(_) => "protocol_violation",
            RuntimeError::Channel(_) => "channel_failure",
            RuntimeError::Worker { .. } => "worker_failed",
            RuntimeError::WorkerPanicked { .. } => "worker_panicked",
            RuntimeError::ReplyTimeout { .. } => "reply_timeout",
            RuntimeError::ReapTimeout { .. } => "reap_timeout",
        }
    }
}
