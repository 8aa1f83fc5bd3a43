//! # Rollcall Runtime
//!
//! The per-partition actor runtime: every partition (one event, or the
//! cross-event `"all"` aggregate) is owned by exactly one spawned task that
//! consumes a bounded mailbox. All state transitions for a partition happen
//! on that task, which is what gives fact processing its strict serial
//! order without any locking in the hot path.
//!
//! ## Architecture
//!
//! - [`actor`] — the actor task itself: phase machine (unbound, loading,
//!   ready), fact application, self-healing broadcast, and the cloneable
//!   [`ActorHandle`] callers talk through.
//! - [`registry`] — lazy actor instantiation keyed by
//!   [`PartitionKey`](rollcall_core::PartitionKey), one live instance per
//!   partition.
//! - [`connection`] — the transport seam: actors push frames through the
//!   [`Connection`] trait and never touch sockets directly.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = PartitionRegistry::new(store);
//! let handle = registry.resolve(PartitionKey::Event(EventId(42))).await;
//! handle.subscribe(PartitionKey::Event(EventId(42)), connection, Role::Guest).await?;
//! handle.signal(Fact::CheckIn(entry)).await?;
//! ```

pub mod actor;
pub mod connection;
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use actor::{ActorHandle, Fact};
pub use connection::{Connection, ConnectionId, SendError};
pub use registry::PartitionRegistry;
