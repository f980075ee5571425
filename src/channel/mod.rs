//! Synchronization channel: identity-addressed mailboxes carrying the
//! poll/status protocol.

mod message;
mod transport;

pub use message::{Identity, Verdict};
pub use transport::{Mailbox, SyncChannel};

pub(crate) use message::{Message, Payload};
