//! Read-side store contract consumed by the actor runtime.
//!
//! The backing store is the only resource shared across partitions. Each
//! partition touches it during its own load step and for privileged
//! on-demand queries; store-level consistency (read-committed) is the
//! store's responsibility, not the actor's.

use crate::cache::SummarySnapshot;
use crate::error::StoreError;
use crate::types::{CheckIn, EventId, EventRecord, InvitedGroup};
use async_trait::async_trait;

/// Point-in-time reads an actor needs from the backing store.
///
/// Implementations may answer `load_summary` from separate unsynchronized
/// queries; callers accept eventual (not strict) consistency at actor-start
/// time.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Load the authoritative summary for one event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable or a row is
    /// malformed. The caller treats this as recoverable and retries on the
    /// next triggering request.
    async fn load_summary(&self, event_id: EventId) -> Result<SummarySnapshot, StoreError>;

    /// Full attendance roster for one event, oldest check-in first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn roster(&self, event_id: EventId) -> Result<Vec<CheckIn>, StoreError>;

    /// All events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn event_list(&self) -> Result<Vec<EventRecord>, StoreError>;

    /// All invitations for one event, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store is unreachable.
    async fn invitation_list(&self, event_id: EventId) -> Result<Vec<InvitedGroup>, StoreError>;
}
