//! # Identity-addressed request/reply transport.
//!
//! [`SyncChannel`] routes messages to per-identity FIFO mailboxes. A
//! participant registers once, receives its [`Mailbox`], and from then on
//! only ever sees messages addressed to it; traffic for other identities
//! sits in their own queues.
//!
//! ## Rules
//! - **Registration is exclusive**: registering an identity twice fails.
//!   For the reserved coordinator address this surfaces resource-key
//!   collisions at startup instead of mid-run.
//! - **Send never blocks and never drops**: mailboxes are unbounded; the
//!   only failure modes are an unknown recipient or a mailbox whose owner
//!   is gone.
//! - **Receive blocks**: [`Mailbox::recv`] suspends until a message for
//!   the owning identity arrives.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};

use crate::error::ChannelError;

use super::message::{Identity, Message};

/// Routing table of the synchronization channel.
///
/// Cheap to share behind an `Arc`; the coordinator registers and
/// unregisters routes, workers only send.
#[derive(Debug, Default)]
pub struct SyncChannel {
    routes: RwLock<HashMap<Identity, mpsc::UnboundedSender<Message>>>,
}

impl SyncChannel {
    /// Creates an empty channel with no registered identities.
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `identity` and returns its mailbox.
    ///
    /// Fails with [`ChannelError::AlreadyRegistered`] if a mailbox for
    /// this identity exists; the caller must treat that as fatal.
    pub async fn register(&self, identity: Identity) -> Result<Mailbox, ChannelError> {
        let mut routes = self.routes.write().await;
        if routes.contains_key(&identity) {
            return Err(ChannelError::AlreadyRegistered { identity });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        routes.insert(identity, tx);
        Ok(Mailbox { identity, rx })
    }

    /// Enqueues `msg` for `to` without blocking.
    pub async fn send(&self, to: Identity, msg: Message) -> Result<(), ChannelError> {
        let routes = self.routes.read().await;
        let route = routes
            .get(&to)
            .ok_or(ChannelError::UnknownRecipient { identity: to })?;
        route
            .send(msg)
            .map_err(|_| ChannelError::Disconnected { identity: to })
    }

    /// Removes the route for `identity`. Idempotent; the owning mailbox
    /// observes [`ChannelError::Closed`] on its next receive.
    pub async fn unregister(&self, identity: Identity) {
        self.routes.write().await.remove(&identity);
    }

    /// True if a mailbox is currently registered for `identity`.
    pub async fn is_registered(&self, identity: Identity) -> bool {
        self.routes.read().await.contains_key(&identity)
    }
}

/// Receiving side of one identity's queue.
///
/// Owned by the registered participant; dropping it makes subsequent
/// sends to this identity fail with [`ChannelError::Disconnected`].
#[derive(Debug)]
pub struct Mailbox {
    identity: Identity,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Mailbox {
    /// The identity this mailbox belongs to.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Waits for the next message addressed to the owning identity.
    ///
    /// Messages arrive in send order. Fails with [`ChannelError::Closed`]
    /// once the identity has been unregistered and the queue is drained.
    pub async fn recv(&mut self) -> Result<Message, ChannelError> {
        self.rx.recv().await.ok_or(ChannelError::Closed {
            identity: self.identity,
        })
    }
}
