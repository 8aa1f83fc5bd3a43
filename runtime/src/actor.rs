//! The per-partition actor: one task, one mailbox, one partition forever.
//!
//! An actor starts unbound. The first message it processes binds it to that
//! message's partition for the rest of its life; any later message naming a
//! different partition is rejected without touching state. Per-event actors
//! hydrate their [`AttendanceCache`] from the store before processing their
//! first triggering request; the `"all"` aggregate actor carries no
//! per-event state and is ready as soon as it binds.
//!
//! ## Ordering
//!
//! The mailbox is the serialization point. Facts are applied and broadcast
//! in mailbox order, so every subscriber observes the same sequence of
//! summaries. Privileged detail queries are the one exception: their store
//! reads run on spawned tasks so a slow query never stalls the fact path.
//!
//! ## Self-healing broadcast
//!
//! Each broadcast serializes the frame once and pushes it to every
//! subscriber; any subscriber whose send fails is removed in the same pass.

use rollcall_core::{
    ActorError, AttendanceCache, CheckIn, EventId, EventRecord, InvitedGroup, PartitionKey,
    QueryKind, Role, ServerMessage, SummaryStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::connection::{Connection, ConnectionId};

// ============================================================================
// Facts
// ============================================================================

/// A domain fact signaled to the runtime after its durable write succeeded.
///
/// Every fact belongs to exactly one partition, derived from the fact
/// itself rather than supplied by the caller.
#[derive(Debug, Clone)]
pub enum Fact {
    /// A check-in row was inserted for an event.
    CheckIn(CheckIn),
    /// An invitation row was inserted for an event.
    Invitation(InvitedGroup),
    /// A new event was created; broadcast on the `"all"` partition.
    EventCreated(EventRecord),
}

impl Fact {
    /// The partition this fact must be processed on.
    #[must_use]
    pub const fn partition(&self) -> PartitionKey {
        match self {
            Self::CheckIn(entry) => PartitionKey::Event(entry.event_id),
            Self::Invitation(entry) => PartitionKey::Event(entry.event_id),
            Self::EventCreated(_) => PartitionKey::All,
        }
    }
}

// ============================================================================
// Mailbox protocol
// ============================================================================

pub(crate) enum ActorMsg {
    Subscribe {
        partition: PartitionKey,
        connection: Arc<dyn Connection>,
        role: Role,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },
    Unsubscribe {
        connection_id: ConnectionId,
    },
    Signal {
        fact: Fact,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },
    Query {
        partition: PartitionKey,
        connection_id: ConnectionId,
        kind: QueryKind,
    },
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable handle to one actor instance.
///
/// All methods go through the actor's mailbox; none of them touch actor
/// state directly.
#[derive(Clone)]
pub struct ActorHandle {
    instance: Uuid,
    tx: mpsc::Sender<ActorMsg>,
}

impl ActorHandle {
    /// Unique identifier of the backing actor instance.
    ///
    /// Two handles resolve the same instance iff their ids are equal.
    #[must_use]
    pub const fn instance_id(&self) -> Uuid {
        self.instance
    }

    /// Whether the backing actor has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Register a subscriber. The actor sends it the `initial_stats`
    /// baseline before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::PartitionMismatch`] if the actor is bound to a
    /// different partition, or [`ActorError::MailboxClosed`] if the
    /// instance is gone.
    pub async fn subscribe(
        &self,
        partition: PartitionKey,
        connection: Arc<dyn Connection>,
        role: Role,
    ) -> Result<(), ActorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ActorMsg::Subscribe {
                partition,
                connection,
                role,
                reply,
            })
            .await
            .map_err(|_| ActorError::MailboxClosed)?;
        rx.await.map_err(|_| ActorError::MailboxClosed)?
    }

    /// Remove a subscriber. Idempotent; unknown ids are ignored, as is a
    /// dead actor (there is nothing left to unsubscribe from).
    pub async fn unsubscribe(&self, connection_id: ConnectionId) {
        let _ = self.tx.send(ActorMsg::Unsubscribe { connection_id }).await;
    }

    /// Signal one fact and wait until it has been applied and broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::PartitionMismatch`] if the fact belongs to a
    /// different partition than the one this actor is bound to,
    /// [`ActorError::NotAggregatePartition`] if an event-created fact
    /// reaches a per-event actor, or [`ActorError::MailboxClosed`].
    pub async fn signal(&self, fact: Fact) -> Result<(), ActorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ActorMsg::Signal { fact, reply })
            .await
            .map_err(|_| ActorError::MailboxClosed)?;
        rx.await.map_err(|_| ActorError::MailboxClosed)?
    }

    /// Enqueue an on-demand detail query for one subscriber.
    ///
    /// The reply, if any, arrives on the subscriber's own connection.
    /// Guests get no reply and no error.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::MailboxClosed`] if the instance is gone.
    pub async fn query(
        &self,
        partition: PartitionKey,
        connection_id: ConnectionId,
        kind: QueryKind,
    ) -> Result<(), ActorError> {
        self.tx
            .send(ActorMsg::Query {
                partition,
                connection_id,
                kind,
            })
            .await
            .map_err(|_| ActorError::MailboxClosed)
    }
}

// ============================================================================
// Actor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No message processed yet; not bound to any partition.
    Unbound,
    /// Bound to an event whose summary has not loaded yet. A failed load
    /// stays here and retries on the next triggering request.
    Loading,
    /// Bound, hydrated, serving.
    Ready,
}

struct Subscriber {
    connection: Arc<dyn Connection>,
    role: Role,
}

pub(crate) struct EventActor {
    store: Arc<dyn SummaryStore>,
    cache: AttendanceCache,
    bound: Option<PartitionKey>,
    phase: Phase,
    subscribers: HashMap<ConnectionId, Subscriber>,
    // Weak so the actor's own reference never keeps the mailbox open; the
    // task exits once every external handle is dropped.
    self_tx: mpsc::WeakSender<ActorMsg>,
}

impl EventActor {
    /// Spawn a fresh, unbound actor task and return its handle.
    pub(crate) fn spawn(store: Arc<dyn SummaryStore>, mailbox_capacity: usize) -> ActorHandle {
        let (tx, mut rx) = mpsc::channel(mailbox_capacity);
        let mut actor = Self {
            store,
            cache: AttendanceCache::new(),
            bound: None,
            phase: Phase::Unbound,
            subscribers: HashMap::new(),
            self_tx: tx.downgrade(),
        };

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                actor.handle(msg).await;
            }
            debug!(partition = ?actor.bound, "partition actor shut down");
        });

        ActorHandle {
            instance: Uuid::new_v4(),
            tx,
        }
    }

    async fn handle(&mut self, msg: ActorMsg) {
        match msg {
            ActorMsg::Subscribe {
                partition,
                connection,
                role,
                reply,
            } => {
                let result = self.subscribe(partition, connection, role).await;
                let _ = reply.send(result);
            }
            ActorMsg::Unsubscribe { connection_id } => {
                if self.subscribers.remove(&connection_id).is_some() {
                    debug!(
                        partition = %self.bound_display(),
                        connection = %connection_id,
                        remaining = self.subscribers.len(),
                        "subscriber removed"
                    );
                }
            }
            ActorMsg::Signal { fact, reply } => {
                let result = self.apply_signal(fact).await;
                let _ = reply.send(result);
            }
            ActorMsg::Query {
                partition,
                connection_id,
                kind,
            } => self.query(partition, connection_id, kind),
        }
    }

    /// Bind on first contact; reject anything naming another partition.
    fn check_bind(&mut self, requested: PartitionKey) -> Result<(), ActorError> {
        match self.bound {
            None => {
                self.bound = Some(requested);
                self.phase = match requested {
                    PartitionKey::All => Phase::Ready,
                    PartitionKey::Event(_) => Phase::Loading,
                };
                info!(partition = %requested, "partition actor bound");
                Ok(())
            }
            Some(bound) if bound == requested => Ok(()),
            Some(bound) => Err(ActorError::PartitionMismatch { bound, requested }),
        }
    }

    /// Hydrate the cache from the store if that has not happened yet.
    ///
    /// A failed load is logged and leaves the actor in `Loading`: it keeps
    /// serving from the empty cache and retries on the next triggering
    /// request.
    async fn ensure_loaded(&mut self) {
        if self.phase != Phase::Loading {
            return;
        }
        let Some(PartitionKey::Event(event_id)) = self.bound else {
            return;
        };

        match self.store.load_summary(event_id).await {
            Ok(snapshot) => {
                self.cache.hydrate(snapshot);
                self.phase = Phase::Ready;
                info!(
                    partition = %event_id,
                    checked_in = self.cache.checked_in(),
                    "summary hydrated from store"
                );
            }
            Err(source) => {
                warn!(
                    partition = %event_id,
                    error = %source,
                    "summary load failed, serving empty cache until retry"
                );
            }
        }
    }

    async fn subscribe(
        &mut self,
        partition: PartitionKey,
        connection: Arc<dyn Connection>,
        role: Role,
    ) -> Result<(), ActorError> {
        self.check_bind(partition)?;
        self.ensure_loaded().await;

        let frame = ServerMessage::InitialStats {
            data: self.cache.summary(),
            acara: self.cache.event().cloned(),
            timestamp: now_millis(),
        };
        let connection_id = connection.id();
        if send_frame(connection.as_ref(), &frame) {
            self.subscribers
                .insert(connection_id, Subscriber { connection, role });
            debug!(
                partition = %self.bound_display(),
                connection = %connection_id,
                %role,
                subscribers = self.subscribers.len(),
                "subscriber added"
            );
        } else {
            // Dead on arrival; never joins the subscriber set.
            debug!(connection = %connection_id, "subscriber rejected initial frame");
        }
        Ok(())
    }

    async fn apply_signal(&mut self, fact: Fact) -> Result<(), ActorError> {
        if let Err(source) = self.check_bind(fact.partition()) {
            // A cross-event fact hitting a per-event actor gets the more
            // specific error.
            return Err(match source {
                ActorError::PartitionMismatch { bound, requested } if requested.is_all() => {
                    ActorError::NotAggregatePartition { bound }
                }
                other => other,
            });
        }

        match fact {
            Fact::CheckIn(entry) => {
                self.ensure_loaded().await;
                self.cache.apply_check_in(&entry);
                debug!(
                    partition = %self.bound_display(),
                    checked_in = self.cache.checked_in(),
                    "check-in applied"
                );
                self.broadcast(&ServerMessage::RealtimeUpdate {
                    data: self.cache.summary(),
                    new_entry: entry,
                    timestamp: now_millis(),
                });
            }
            Fact::Invitation(entry) => {
                self.ensure_loaded().await;
                self.cache.apply_invitation(entry.clone());
                self.broadcast(&ServerMessage::RealtimeUpdateUndangan {
                    data: self.cache.summary(),
                    new_entry: entry,
                    timestamp: now_millis(),
                });
            }
            Fact::EventCreated(record) => {
                self.broadcast(&ServerMessage::RealtimeUpdateAcara {
                    new_acara: record,
                    timestamp: now_millis(),
                });
            }
        }
        Ok(())
    }

    /// Run one on-demand detail query for a subscriber.
    ///
    /// Guests are ignored without a reply or an error. The store read runs
    /// on its own task; a reply send that fails feeds an unsubscribe back
    /// through the mailbox.
    fn query(&mut self, partition: PartitionKey, connection_id: ConnectionId, kind: QueryKind) {
        if let Err(source) = self.check_bind(partition) {
            warn!(connection = %connection_id, error = %source, "query dropped");
            return;
        }
        let Some(subscriber) = self.subscribers.get(&connection_id) else {
            debug!(connection = %connection_id, "query from unknown connection dropped");
            return;
        };
        if !subscriber.role.is_privileged() {
            debug!(connection = %connection_id, "unprivileged query ignored");
            return;
        }

        let event_id = match self.bound {
            Some(PartitionKey::Event(id)) => Some(id),
            _ => None,
        };
        if matches!(kind, QueryKind::Roster | QueryKind::InvitationList) && event_id.is_none() {
            debug!(connection = %connection_id, "per-event query on aggregate partition dropped");
            return;
        }

        let store = Arc::clone(&self.store);
        let connection = Arc::clone(&subscriber.connection);
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let reply = run_query(store.as_ref(), kind, event_id).await;
            match reply {
                Ok(message) => {
                    if !send_frame(connection.as_ref(), &message) {
                        if let Some(tx) = self_tx.upgrade() {
                            let _ = tx.send(ActorMsg::Unsubscribe { connection_id }).await;
                        }
                    }
                }
                Err(source) => {
                    warn!(connection = %connection_id, error = %source, "detail query failed");
                }
            }
        });
    }

    /// Serialize once, push to every subscriber, prune the dead.
    fn broadcast(&mut self, message: &ServerMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(source) => {
                error!(error = %source, "frame serialization failed, broadcast dropped");
                return;
            }
        };

        let before = self.subscribers.len();
        self.subscribers
            .retain(|_, subscriber| subscriber.connection.send(&frame).is_ok());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            debug!(
                partition = %self.bound_display(),
                pruned,
                remaining = self.subscribers.len(),
                "pruned dead subscribers during broadcast"
            );
        }
    }

    fn bound_display(&self) -> String {
        self.bound
            .map_or_else(|| "unbound".to_string(), |key| key.to_string())
    }
}

async fn run_query(
    store: &dyn SummaryStore,
    kind: QueryKind,
    event_id: Option<EventId>,
) -> Result<ServerMessage, rollcall_core::StoreError> {
    match (kind, event_id) {
        (QueryKind::Roster, Some(id)) => {
            Ok(ServerMessage::DataPresensi {
                results: store.roster(id).await?,
            })
        }
        (QueryKind::InvitationList, Some(id)) => Ok(ServerMessage::DataUndangan {
            results: store.invitation_list(id).await?,
        }),
        (QueryKind::EventList, _) => Ok(ServerMessage::DataAcara {
            results: store.event_list().await?,
        }),
        // Guarded at enqueue time; unreachable in practice.
        (QueryKind::Roster | QueryKind::InvitationList, None) => Ok(ServerMessage::DataPresensi {
            results: Vec::new(),
        }),
    }
}

fn send_frame(connection: &dyn Connection, message: &ServerMessage) -> bool {
    match serde_json::to_string(message) {
        Ok(frame) => connection.send(&frame).is_ok(),
        Err(source) => {
            error!(error = %source, "frame serialization failed");
            false
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
