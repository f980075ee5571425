//! Wire types for the request/reply protocol between the coordinator
//! and its workers.

use std::fmt;

/// Address of a participant on the synchronization channel.
///
/// The coordinator owns the reserved address [`Identity::COORDINATOR`];
/// worker identities are allocated monotonically starting from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(u32);

impl Identity {
    /// The well-known coordinator address.
    pub const COORDINATOR: Identity = Identity(0);

    /// Creates an identity from a raw value.
    pub fn new(raw: u32) -> Self {
        Identity(raw)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Worker's answer to a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The worker has not yet reached its deadline and keeps running.
    Running,
    /// The worker reached its deadline and exits after this reply.
    Terminating,
}

/// Message payload.
///
/// The protocol has exactly two shapes: the coordinator polls, the
/// worker answers with a status. Workers never initiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Payload {
    /// Coordinator asks a worker for its verdict.
    Poll,
    /// Worker reports its verdict back.
    Status(Verdict),
}

/// A message on the synchronization channel. The recipient is given to
/// [`SyncChannel::send`](crate::channel::SyncChannel::send); the sender
/// travels inside.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Message {
    pub from: Identity,
    pub payload: Payload,
}

impl Message {
    /// A poll request from `from` (in practice, the coordinator).
    pub fn poll(from: Identity) -> Self {
        Self {
            from,
            payload: Payload::Poll,
        }
    }

    /// A status reply from `from` carrying its verdict.
    pub fn status(from: Identity, verdict: Verdict) -> Self {
        Self {
            from,
            payload: Payload::Status(verdict),
        }
    }
}
