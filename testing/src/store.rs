//! Scripted in-memory store with failure injection.

use async_trait::async_trait;
use rollcall_core::{
    CheckIn, EventId, EventRecord, InvitedGroup, StoreError, SummarySnapshot, SummaryStore,
};
use std::sync::{Mutex, PoisonError};

#[derive(Default)]
struct StoreState {
    snapshot: SummarySnapshot,
    roster: Vec<CheckIn>,
    events: Vec<EventRecord>,
    invitations: Vec<InvitedGroup>,
    failing_loads: u32,
    load_calls: u32,
}

/// A [`SummaryStore`] whose answers are scripted up front.
///
/// `fail_next_loads` makes the next N `load_summary` calls return
/// [`StoreError::Unavailable`], which is how load-retry behavior gets
/// exercised without a real outage.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// An empty store: no event, no invitations, zero check-ins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `load_summary` answers with the given snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: SummarySnapshot) -> Self {
        let store = Self::default();
        store.lock().snapshot = snapshot;
        store
    }

    /// Make the next `count` summary loads fail as unavailable.
    pub fn fail_next_loads(&self, count: u32) {
        self.lock().failing_loads = count;
    }

    /// How many times `load_summary` has been called.
    #[must_use]
    pub fn load_calls(&self) -> u32 {
        self.lock().load_calls
    }

    /// Script the roster query's answer.
    pub fn set_roster(&self, roster: Vec<CheckIn>) {
        self.lock().roster = roster;
    }

    /// Script the event-list query's answer.
    pub fn set_events(&self, events: Vec<EventRecord>) {
        self.lock().events = events;
    }

    /// Script the invitation-list query's answer.
    pub fn set_invitations(&self, invitations: Vec<InvitedGroup>) {
        self.lock().invitations = invitations;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SummaryStore for InMemoryStore {
    async fn load_summary(&self, _event_id: EventId) -> Result<SummarySnapshot, StoreError> {
        let mut state = self.lock();
        state.load_calls += 1;
        if state.failing_loads > 0 {
            state.failing_loads -= 1;
            return Err(StoreError::Unavailable("scripted outage".to_string()));
        }
        Ok(state.snapshot.clone())
    }

    async fn roster(&self, _event_id: EventId) -> Result<Vec<CheckIn>, StoreError> {
        Ok(self.lock().roster.clone())
    }

    async fn event_list(&self) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.lock().events.clone())
    }

    async fn invitation_list(&self, _event_id: EventId) -> Result<Vec<InvitedGroup>, StoreError> {
        Ok(self.lock().invitations.clone())
    }
}
