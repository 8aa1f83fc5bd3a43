//! Error taxonomy shared across the actor runtime and store implementations.

use crate::types::PartitionKey;
use thiserror::Error;

/// Failures talking to the backing store.
///
/// All store failures are recoverable from the actor's point of view: a
/// failed load leaves the actor eligible to retry on the next triggering
/// request, and is logged rather than surfaced to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A row came back in a shape the domain types cannot represent.
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

/// Failures surfaced by an actor to its callers.
///
/// Fatal to the offending request, never to the actor: state for the bound
/// partition is untouched by any of these.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The actor is bound to one partition and the request names another.
    #[error("actor bound to partition {bound}, request names {requested}")]
    PartitionMismatch {
        /// The partition this actor bound to first.
        bound: PartitionKey,
        /// The partition the offending request named.
        requested: PartitionKey,
    },

    /// An `event_created` fact was signaled to a per-event partition.
    #[error("event_created signals are only valid on the \"all\" partition, not {bound}")]
    NotAggregatePartition {
        /// The per-event partition that received the signal.
        bound: PartitionKey,
    },

    /// The actor's mailbox is gone; the instance was evicted or shut down.
    ///
    /// Callers should re-resolve the partition through the registry, which
    /// recreates the actor from store state.
    #[error("actor mailbox closed")]
    MailboxClosed,
}
