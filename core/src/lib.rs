//! # Rollcall Core
//!
//! Domain model and shared contracts for the Rollcall live-attendance system.
//!
//! This crate is deliberately free of I/O. It provides:
//!
//! - **Domain types**: events, invited groups, check-ins, roles, partitions
//! - **`AttendanceCache`**: the derived in-memory summary owned by one actor
//! - **Wire protocol**: the `type`-tagged JSON frames dashboards consume
//! - **Store traits**: the read-side collaborator contract actors depend on
//! - **Error taxonomy**: partition, store, and actor failure modes
//!
//! ## Architecture
//!
//! The runtime crate owns concurrency (one actor task per partition); this
//! crate owns the pure state transitions those actors apply. Keeping the
//! cache pure makes every invariant unit-testable without a runtime.

pub mod cache;
pub mod error;
pub mod message;
pub mod store;
pub mod types;

pub use cache::{AttendanceCache, StatsSummary, SummarySnapshot};
pub use error::{ActorError, StoreError};
pub use message::{ClientMessage, QueryKind, ServerMessage};
pub use store::SummaryStore;
pub use types::{
    CheckIn, EventId, EventRecord, GroupRecord, InvitedGroup, NewCheckIn, NewEvent, NewInvitation,
    PartitionKey, Role,
};
