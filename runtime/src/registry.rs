//! Lazy, per-partition actor instantiation.
//!
//! One live actor instance per [`PartitionKey`]. The registry map is behind
//! a single async mutex, held only long enough to look up or spawn; every
//! concurrent resolver of the same partition gets a handle to the same
//! instance. A handle whose actor has shut down is replaced transparently
//! on the next resolve, and the replacement rebuilds its cache from the
//! store.

use rollcall_core::{PartitionKey, SummaryStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::actor::{ActorHandle, EventActor};

/// Default mailbox capacity for spawned actors.
const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Owns every live actor handle, keyed by partition.
pub struct PartitionRegistry {
    store: Arc<dyn SummaryStore>,
    mailbox_capacity: usize,
    actors: Mutex<HashMap<PartitionKey, ActorHandle>>,
}

impl PartitionRegistry {
    /// Create a registry over the given store with the default mailbox
    /// capacity.
    #[must_use]
    pub fn new(store: Arc<dyn SummaryStore>) -> Self {
        Self::with_mailbox_capacity(store, DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a registry with an explicit per-actor mailbox capacity.
    #[must_use]
    pub fn with_mailbox_capacity(store: Arc<dyn SummaryStore>, mailbox_capacity: usize) -> Self {
        Self {
            store,
            mailbox_capacity,
            actors: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the live actor for a partition, spawning it if absent or if
    /// the previous instance has shut down.
    pub async fn resolve(&self, partition: PartitionKey) -> ActorHandle {
        let mut actors = self.actors.lock().await;
        if let Some(handle) = actors.get(&partition) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let handle = EventActor::spawn(Arc::clone(&self.store), self.mailbox_capacity);
        actors.insert(partition, handle.clone());
        info!(%partition, "partition actor spawned");
        handle
    }

    /// Drop the registry's handle to a partition's actor.
    ///
    /// The actor task exits once every outstanding handle is gone; a later
    /// [`resolve`](Self::resolve) spawns a fresh instance that rehydrates
    /// from the store. Returns whether a handle was present.
    pub async fn evict(&self, partition: PartitionKey) -> bool {
        self.actors.lock().await.remove(&partition).is_some()
    }

    /// Number of partitions with a registered actor handle.
    pub async fn active_partitions(&self) -> usize {
        self.actors.lock().await.len()
    }
}
