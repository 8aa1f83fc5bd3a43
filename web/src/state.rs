//! Shared application state handed to every route handler.

use crate::config::Config;
use rollcall_postgres::PostgresStore;
use rollcall_runtime::PartitionRegistry;
use std::sync::Arc;

/// Everything a handler needs: the store for durable writes and direct
/// reads, the registry for reaching partition actors, and config for auth.
#[derive(Clone)]
pub struct AppState {
    /// Durable store; also the summary source actors hydrate from.
    pub store: Arc<PostgresStore>,
    /// One actor handle per live partition.
    pub registry: Arc<PartitionRegistry>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble state around a connected store.
    #[must_use]
    pub fn new(store: PostgresStore, config: Config) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(PartitionRegistry::new(store.clone()));
        Self {
            store,
            registry,
            config: Arc::new(config),
        }
    }
}
