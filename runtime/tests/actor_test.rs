//! End-to-end runtime behavior: binding, hydration, ordering, broadcast
//! pruning, privileged queries, and registry lifecycle.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use rollcall_core::{
    ActorError, EventId, PartitionKey, QueryKind, Role, SummarySnapshot,
};
use rollcall_runtime::{Connection, Fact, PartitionRegistry};
use rollcall_testing::fixtures::{check_in, event, invitation};
use rollcall_testing::{InMemoryStore, RecordingConnection};
use std::sync::Arc;
use std::time::Duration;

const EVENT: PartitionKey = PartitionKey::Event(EventId(42));

fn seeded_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_snapshot(SummarySnapshot {
        event: Some(event(42, "Town Hall")),
        invited_groups: vec![invitation(1, 42, "Finance"), invitation(2, 42, "Legal")],
        attended_group_names: vec!["Finance".to_string()],
        checked_in_count: 7,
    }))
}

/// Poll until `condition` holds or a short deadline passes.
async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within deadline");
}

#[tokio::test]
async fn subscriber_receives_hydrated_baseline_before_subscribe_returns() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let connection = Arc::new(RecordingConnection::new());

    let handle = registry.resolve(EVENT).await;
    handle
        .subscribe(EVENT, connection.clone(), Role::Guest)
        .await
        .unwrap();

    let frames = connection.json_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], "initial_stats");
    assert_eq!(frames[0]["data"]["jmlPesertaHadir"], 7);
    assert_eq!(frames[0]["data"]["jmlSubGroupHadir"], 1);
    assert_eq!(frames[0]["data"]["jmlSubGroup"], 2);
    assert_eq!(frames[0]["data"]["subGroupBelumHadir"][0]["nama_subgroup"], "Legal");
    assert_eq!(frames[0]["acara"]["nama_acara"], "Town Hall");
}

#[tokio::test]
async fn facts_broadcast_in_signal_order_with_monotonic_counts() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;

    let first = Arc::new(RecordingConnection::new());
    let second = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, first.clone(), Role::Guest).await.unwrap();
    handle.subscribe(EVENT, second.clone(), Role::Guest).await.unwrap();

    for id in 1..=3 {
        handle.signal(Fact::CheckIn(check_in(id, 42, "Legal"))).await.unwrap();
    }

    for connection in [&first, &second] {
        let frames = connection.json_frames();
        assert_eq!(frames.len(), 4, "baseline plus three updates");
        for (i, expected) in [8, 9, 10].iter().enumerate() {
            assert_eq!(frames[i + 1]["type"], "realtime_update");
            assert_eq!(frames[i + 1]["data"]["jmlPesertaHadir"], *expected);
        }
    }

    // Legal attended with the first update; pending list is empty after.
    let frames = first.json_frames();
    assert_eq!(frames[1]["data"]["jmlSubGroupHadir"], 2);
    assert_eq!(frames[1]["data"]["subGroupBelumHadir"], serde_json::json!([]));
    assert_eq!(frames[1]["new_entry"]["nama"], "attendee-1");
}

#[tokio::test]
async fn invitation_fact_broadcasts_updated_pending_list() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;
    let connection = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, connection.clone(), Role::Guest).await.unwrap();

    handle
        .signal(Fact::Invitation(invitation(3, 42, "Procurement")))
        .await
        .unwrap();

    let last = connection.last_json().unwrap();
    assert_eq!(last["type"], "realtime_update_undangan");
    assert_eq!(last["data"]["jmlSubGroup"], 3);
    assert_eq!(last["new_entry"]["nama_subgroup"], "Procurement");
    let pending = last["data"]["subGroupBelumHadir"].as_array().unwrap();
    assert_eq!(pending.len(), 2);
}

#[tokio::test]
async fn event_created_broadcasts_only_on_aggregate_partition() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);

    let all = registry.resolve(PartitionKey::All).await;
    let watcher = Arc::new(RecordingConnection::new());
    all.subscribe(PartitionKey::All, watcher.clone(), Role::Guest).await.unwrap();

    all.signal(Fact::EventCreated(event(99, "Quarterly Review"))).await.unwrap();
    let last = watcher.last_json().unwrap();
    assert_eq!(last["type"], "realtime_update_acara");
    assert_eq!(last["new_acara"]["id_acara"], 99);

    // A per-event actor refuses the cross-event fact.
    let per_event = registry.resolve(EVENT).await;
    per_event.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    let err = per_event
        .signal(Fact::EventCreated(event(100, "Offsite")))
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::NotAggregatePartition { .. }));
}

#[tokio::test]
async fn actor_never_rebinds_to_another_partition() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;
    let connection = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, connection.clone(), Role::Guest).await.unwrap();

    let other = PartitionKey::Event(EventId(7));
    let err = handle
        .subscribe(other, Arc::new(RecordingConnection::new()), Role::Guest)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ActorError::PartitionMismatch { bound, requested }
            if bound == EVENT && requested == other
    ));

    let err = handle.signal(Fact::CheckIn(check_in(1, 7, "Legal"))).await.unwrap_err();
    assert!(matches!(err, ActorError::PartitionMismatch { .. }));

    // The bound partition is untouched by rejected requests.
    handle.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    let last = connection.last_json().unwrap();
    assert_eq!(last["data"]["jmlPesertaHadir"], 8);
}

#[tokio::test]
async fn dead_subscribers_are_pruned_without_disturbing_the_rest() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;

    let healthy = Arc::new(RecordingConnection::new());
    let dying = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, healthy.clone(), Role::Guest).await.unwrap();
    handle.subscribe(EVENT, dying.clone(), Role::Guest).await.unwrap();

    dying.sever();
    handle.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    handle.signal(Fact::CheckIn(check_in(2, 42, "Legal"))).await.unwrap();

    // The severed connection saw only its baseline.
    assert_eq!(dying.frame_count(), 1);
    assert_eq!(healthy.frame_count(), 3);
}

#[tokio::test]
async fn unsubscribe_is_idempotent() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;
    let connection = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, connection.clone(), Role::Guest).await.unwrap();

    handle.unsubscribe(connection.id()).await;
    handle.unsubscribe(connection.id()).await;

    // Actor still serves facts; the removed subscriber hears nothing more.
    handle.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    assert_eq!(connection.frame_count(), 1);
}

#[tokio::test]
async fn failed_load_serves_empty_cache_and_retries_on_next_fact() {
    let store = seeded_store();
    store.fail_next_loads(1);
    let registry = PartitionRegistry::new(store.clone());
    let handle = registry.resolve(EVENT).await;
    let connection = Arc::new(RecordingConnection::new());

    // Subscribe triggers the failing load; the baseline is empty, not an error.
    handle.subscribe(EVENT, connection.clone(), Role::Guest).await.unwrap();
    let baseline = connection.last_json().unwrap();
    assert_eq!(baseline["type"], "initial_stats");
    assert_eq!(baseline["data"]["jmlPesertaHadir"], 0);
    assert!(baseline["acara"].is_null());
    assert_eq!(store.load_calls(), 1);

    // The next fact retries the load, then applies on top of the snapshot.
    handle.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    assert_eq!(store.load_calls(), 2);
    let update = connection.last_json().unwrap();
    assert_eq!(update["data"]["jmlPesertaHadir"], 8);
    assert_eq!(update["data"]["jmlSubGroupHadir"], 2);

    // Hydration happened exactly once.
    handle.signal(Fact::CheckIn(check_in(2, 42, "Legal"))).await.unwrap();
    assert_eq!(store.load_calls(), 2);
}

#[tokio::test]
async fn privileged_query_replies_on_the_asking_connection_only() {
    let store = seeded_store();
    store.set_roster(vec![check_in(1, 42, "Finance"), check_in(2, 42, "Legal")]);
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;

    let admin = Arc::new(RecordingConnection::new());
    let bystander = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, admin.clone(), Role::Admin).await.unwrap();
    handle.subscribe(EVENT, bystander.clone(), Role::Guest).await.unwrap();

    handle.query(EVENT, admin.id(), QueryKind::Roster).await.unwrap();

    let admin_for_wait = admin.clone();
    eventually(move || admin_for_wait.frame_count() == 2).await;
    let reply = admin.last_json().unwrap();
    assert_eq!(reply["type"], "data_presensi");
    assert_eq!(reply["results"].as_array().unwrap().len(), 2);
    assert_eq!(bystander.frame_count(), 1);
}

#[tokio::test]
async fn guest_query_is_silently_ignored() {
    let store = seeded_store();
    store.set_roster(vec![check_in(1, 42, "Finance")]);
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(EVENT).await;
    let guest = Arc::new(RecordingConnection::new());
    handle.subscribe(EVENT, guest.clone(), Role::Guest).await.unwrap();

    handle.query(EVENT, guest.id(), QueryKind::Roster).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // No reply, no error, and the connection still works.
    assert_eq!(guest.frame_count(), 1);
    handle.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    assert_eq!(guest.frame_count(), 2);
}

#[tokio::test]
async fn event_list_query_works_on_the_aggregate_partition() {
    let store = seeded_store();
    store.set_events(vec![event(42, "Town Hall"), event(99, "Quarterly Review")]);
    let registry = PartitionRegistry::new(store);
    let handle = registry.resolve(PartitionKey::All).await;
    let admin = Arc::new(RecordingConnection::new());
    handle.subscribe(PartitionKey::All, admin.clone(), Role::Super).await.unwrap();

    handle
        .query(PartitionKey::All, admin.id(), QueryKind::EventList)
        .await
        .unwrap();

    let admin_for_wait = admin.clone();
    eventually(move || admin_for_wait.frame_count() == 2).await;
    let reply = admin.last_json().unwrap();
    assert_eq!(reply["type"], "data_acara");
    assert_eq!(reply["results"][1]["nama_acara"], "Quarterly Review");
}

#[tokio::test]
async fn registry_returns_one_instance_per_partition() {
    let store = seeded_store();
    let registry = Arc::new(PartitionRegistry::new(store));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.resolve(EVENT).await.instance_id()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "every resolver saw the same instance");

    let other = registry.resolve(PartitionKey::Event(EventId(7))).await;
    assert_ne!(other.instance_id(), ids[0]);
    assert_eq!(registry.active_partitions().await, 2);
}

#[tokio::test]
async fn evicted_partition_is_rebuilt_from_the_store() {
    let store = seeded_store();
    let registry = PartitionRegistry::new(store.clone());

    let first = registry.resolve(EVENT).await;
    let connection = Arc::new(RecordingConnection::new());
    first.subscribe(EVENT, connection.clone(), Role::Guest).await.unwrap();
    first.signal(Fact::CheckIn(check_in(1, 42, "Legal"))).await.unwrap();
    assert_eq!(store.load_calls(), 1);

    assert!(registry.evict(EVENT).await);
    drop(first);

    let second = registry.resolve(EVENT).await;
    let reconnect = Arc::new(RecordingConnection::new());
    second.subscribe(EVENT, reconnect.clone(), Role::Guest).await.unwrap();

    // Fresh instance, fresh hydration. The in-flight check-in from the old
    // instance is not in the scripted snapshot, so the count resets to it.
    assert_eq!(store.load_calls(), 2);
    let baseline = reconnect.last_json().unwrap();
    assert_eq!(baseline["data"]["jmlPesertaHadir"], 7);
}
