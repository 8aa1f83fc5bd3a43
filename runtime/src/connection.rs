//! Transport seam between actors and whatever carries frames.
//!
//! Actors never hold sockets. They hold [`Connection`] trait objects whose
//! [`send`](Connection::send) must be non-blocking and synchronous: the real
//! implementation queues onto a writer task's channel, test doubles record.
//! A failed send is taken as proof the connection is dead.

use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Opaque identifier for one subscriber connection.
///
/// Minted by the transport layer when the connection is accepted; stable for
/// the connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Mint a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The subscriber's transport rejected a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("subscriber connection closed")]
pub struct SendError;

/// One subscriber as an actor sees it: an identity and a frame sink.
pub trait Connection: Send + Sync {
    /// Stable identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Queue one serialized JSON frame for delivery.
    ///
    /// Must not block: implementations hand the frame to a writer task and
    /// return. Delivery past this point is best-effort.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] when the transport is gone. The actor treats
    /// this as terminal and prunes the subscriber.
    fn send(&self, frame: &str) -> Result<(), SendError>;
}
