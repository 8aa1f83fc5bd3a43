//! The derived in-memory attendance summary owned by one actor.
//!
//! `AttendanceCache` is a pure state value: the runtime feeds it a snapshot
//! loaded from the store, then applies fact signals one at a time. Every
//! transition here is synchronous and deterministic, which is what makes the
//! actor's invariants unit-testable without a runtime.
//!
//! # Invariants
//!
//! - `checked_in` increases by exactly 1 per applied check-in; the cache does
//!   not deduplicate (exactly-once delivery is the gateway's contract).
//! - The not-yet-attended list always equals the invited sequence minus
//!   groups whose name has attended, recomputed in full whenever either side
//!   changes — never patched incrementally.
//! - An invited group's name joins the attended set at most once; a second
//!   check-in for the same group name changes only the headcount.

use crate::types::{CheckIn, EventRecord, InvitedGroup};
use serde::{Deserialize, Serialize};

/// The consistent snapshot an actor loads once from the store.
///
/// All fields reflect the same point in time as far as the store can promise;
/// the cache accepts eventual consistency at hydrate time (spec'd store reads
/// are separate read-committed queries).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarySnapshot {
    /// The event record, if the event exists.
    pub event: Option<EventRecord>,
    /// Every invitation row for the event, in insertion order.
    pub invited_groups: Vec<InvitedGroup>,
    /// Distinct group names with at least one check-in.
    pub attended_group_names: Vec<String>,
    /// Total check-in rows for the event.
    pub checked_in_count: u64,
}

/// The statistics object broadcast to dashboards.
///
/// Field names on the wire match what the original dashboards consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Total attendees checked in.
    #[serde(rename = "jmlPesertaHadir")]
    pub checked_in: u64,
    /// Distinct invited-group names with at least one check-in.
    #[serde(rename = "jmlSubGroupHadir")]
    pub attended_groups: u64,
    /// Distinct invited-group names, attended or not.
    #[serde(rename = "jmlSubGroup")]
    pub invited_groups: u64,
    /// Invited groups with zero check-ins so far.
    #[serde(rename = "subGroupBelumHadir")]
    pub not_yet_attended: Vec<InvitedGroup>,
}

/// Derived per-event state, owned exclusively by one actor instance.
///
/// Created empty, populated exactly once by [`AttendanceCache::hydrate`],
/// and mutated only by the owning actor's single-threaded update path.
#[derive(Debug, Clone, Default)]
pub struct AttendanceCache {
    event: Option<EventRecord>,
    invited: Vec<InvitedGroup>,
    attended: Vec<String>,
    not_yet_attended: Vec<InvitedGroup>,
    checked_in: u64,
    initialized: bool,
}

impl AttendanceCache {
    /// Create an empty, uninitialized cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            event: None,
            invited: Vec::new(),
            attended: Vec::new(),
            not_yet_attended: Vec::new(),
            checked_in: 0,
            initialized: false,
        }
    }

    /// Whether the one-time load from the store has completed.
    #[must_use]
    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    /// The event record captured at load time, if any.
    #[must_use]
    pub const fn event(&self) -> Option<&EventRecord> {
        self.event.as_ref()
    }

    /// Total check-ins signaled so far.
    #[must_use]
    pub const fn checked_in(&self) -> u64 {
        self.checked_in
    }

    /// Populate the cache from an authoritative store snapshot.
    ///
    /// Idempotent by construction at the actor level (the actor only calls
    /// this while uninitialized), but safe to call again: the snapshot fully
    /// replaces derived state.
    pub fn hydrate(&mut self, snapshot: SummarySnapshot) {
        self.event = snapshot.event;
        self.invited = snapshot.invited_groups;
        self.attended = snapshot.attended_group_names;
        self.checked_in = snapshot.checked_in_count;
        self.recompute_not_yet_attended();
        self.initialized = true;
    }

    /// Apply one check-in fact.
    ///
    /// Increments the headcount unconditionally. If the entry's group name is
    /// new to the attended set, the not-yet-attended list is recomputed from
    /// the full invited sequence.
    pub fn apply_check_in(&mut self, entry: &CheckIn) {
        self.checked_in += 1;

        if !self.attended.iter().any(|name| name == &entry.group_name) {
            self.attended.push(entry.group_name.clone());
            self.recompute_not_yet_attended();
        }
    }

    /// Apply one new-invitation fact.
    ///
    /// Appends to the invited sequence and recomputes the not-yet-attended
    /// list from it, so a duplicate group name can never inflate the distinct
    /// invited count.
    pub fn apply_invitation(&mut self, entry: InvitedGroup) {
        self.invited.push(entry);
        self.recompute_not_yet_attended();
    }

    /// Build the statistics object for broadcast.
    #[must_use]
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            checked_in: self.checked_in,
            attended_groups: self.attended.len() as u64,
            invited_groups: self.distinct_invited(),
            not_yet_attended: self.not_yet_attended.clone(),
        }
    }

    /// Distinct group names in the invited sequence.
    fn distinct_invited(&self) -> u64 {
        let mut names: Vec<&str> = self
            .invited
            .iter()
            .map(|group| group.group_name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names.len() as u64
    }

    fn recompute_not_yet_attended(&mut self) {
        self.not_yet_attended = self
            .invited
            .iter()
            .filter(|group| !self.attended.iter().any(|name| name == &group.group_name))
            .cloned()
            .collect();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::types::EventId;

    fn invited(id: i64, name: &str) -> InvitedGroup {
        InvitedGroup {
            id,
            event_id: EventId(42),
            group_id: id,
            group_name: name.to_string(),
            category_name: "Directorate".to_string(),
        }
    }

    fn check_in(id: i64, group: &str) -> CheckIn {
        CheckIn {
            id,
            event_id: EventId(42),
            recorded_at: 1_700_000_000_000 + id,
            name: format!("attendee-{id}"),
            group_id: 1,
            group_name: group.to_string(),
            position: None,
            staff_type: None,
            gender: None,
            phone: None,
            email: None,
            latitude: None,
            longitude: None,
            device_id: None,
            event_name: None,
        }
    }

    #[test]
    fn count_equals_number_of_applied_check_ins() {
        let mut cache = AttendanceCache::new();
        for i in 0..25 {
            cache.apply_check_in(&check_in(i, "Finance"));
        }
        assert_eq!(cache.summary().checked_in, 25);
    }

    #[test]
    fn duplicate_signals_are_not_deduplicated() {
        // Exactly-once delivery is the gateway's job; the cache counts blindly.
        let mut cache = AttendanceCache::new();
        let entry = check_in(1, "Finance");
        cache.apply_check_in(&entry);
        cache.apply_check_in(&entry);
        assert_eq!(cache.summary().checked_in, 2);
        assert_eq!(cache.summary().attended_groups, 1);
    }

    #[test]
    fn first_check_in_moves_group_out_of_not_yet_attended() {
        let mut cache = AttendanceCache::new();
        cache.apply_invitation(invited(1, "Finance"));

        let before = cache.summary();
        assert_eq!(before.invited_groups, 1);
        assert_eq!(before.not_yet_attended.len(), 1);
        assert_eq!(before.not_yet_attended[0].group_name, "Finance");

        cache.apply_check_in(&check_in(1, "Finance"));
        let after = cache.summary();
        assert_eq!(after.checked_in, 1);
        assert_eq!(after.attended_groups, 1);
        assert!(after.not_yet_attended.is_empty());

        // Second check-in for the same group: headcount only.
        cache.apply_check_in(&check_in(2, "Finance"));
        let again = cache.summary();
        assert_eq!(again.checked_in, 2);
        assert_eq!(again.attended_groups, 1);
        assert!(again.not_yet_attended.is_empty());
    }

    #[test]
    fn attendance_from_uninvited_group_is_tracked() {
        // A group may check in without ever being formally invited.
        let mut cache = AttendanceCache::new();
        cache.apply_invitation(invited(1, "Finance"));
        cache.apply_check_in(&check_in(1, "Walk-ins"));

        let summary = cache.summary();
        assert_eq!(summary.checked_in, 1);
        assert_eq!(summary.attended_groups, 1);
        // Finance still pending: the uninvited group does not satisfy it.
        assert_eq!(summary.not_yet_attended.len(), 1);
    }

    #[test]
    fn duplicate_group_names_do_not_inflate_invited_count() {
        let mut cache = AttendanceCache::new();
        cache.apply_invitation(invited(1, "Finance"));
        cache.apply_invitation(invited(2, "Finance"));
        cache.apply_invitation(invited(3, "Legal"));
        assert_eq!(cache.summary().invited_groups, 2);
    }

    #[test]
    fn invitation_for_already_attended_group_is_not_pending() {
        let mut cache = AttendanceCache::new();
        cache.apply_check_in(&check_in(1, "Finance"));
        cache.apply_invitation(invited(1, "Finance"));

        let summary = cache.summary();
        assert!(summary.not_yet_attended.is_empty());
        assert_eq!(summary.invited_groups, 1);
        assert_eq!(summary.attended_groups, 1);
    }

    #[test]
    fn hydrate_replaces_derived_state() {
        let mut cache = AttendanceCache::new();
        assert!(!cache.initialized());

        cache.hydrate(SummarySnapshot {
            event: None,
            invited_groups: vec![invited(1, "Finance"), invited(2, "Legal")],
            attended_group_names: vec!["Finance".to_string()],
            checked_in_count: 7,
        });

        assert!(cache.initialized());
        let summary = cache.summary();
        assert_eq!(summary.checked_in, 7);
        assert_eq!(summary.attended_groups, 1);
        assert_eq!(summary.invited_groups, 2);
        assert_eq!(summary.not_yet_attended.len(), 1);
        assert_eq!(summary.not_yet_attended[0].group_name, "Legal");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn headcount_tracks_applied_signals(
                groups in proptest::collection::vec("[A-Z][a-z]{2,8}", 0..40),
            ) {
                let mut cache = AttendanceCache::new();
                for (i, name) in groups.iter().enumerate() {
                    cache.apply_check_in(&check_in(i as i64, name));
                }
                let summary = cache.summary();
                prop_assert_eq!(summary.checked_in, groups.len() as u64);

                let mut distinct = groups.clone();
                distinct.sort();
                distinct.dedup();
                prop_assert_eq!(summary.attended_groups, distinct.len() as u64);
            }

            #[test]
            fn attended_and_pending_partition_the_invited_names(
                names in proptest::collection::vec("[A-Z][a-z]{2,8}", 1..20),
                attend in proptest::collection::vec(any::<bool>(), 20),
            ) {
                let mut cache = AttendanceCache::new();
                for (i, name) in names.iter().enumerate() {
                    cache.apply_invitation(invited(i as i64, name));
                }
                for (i, (name, go)) in names.iter().zip(&attend).enumerate() {
                    if *go {
                        cache.apply_check_in(&check_in(i as i64, name));
                    }
                }

                let summary = cache.summary();
                let mut pending: Vec<&str> = summary
                    .not_yet_attended
                    .iter()
                    .map(|group| group.group_name.as_str())
                    .collect();
                pending.sort_unstable();
                pending.dedup();
                prop_assert_eq!(
                    pending.len() as u64 + summary.attended_groups,
                    summary.invited_groups
                );
            }
        }
    }

    #[test]
    fn summary_serializes_with_dashboard_field_names() {
        let mut cache = AttendanceCache::new();
        cache.apply_invitation(invited(1, "Finance"));
        let json = serde_json::to_value(cache.summary()).unwrap();

        assert_eq!(json["jmlPesertaHadir"], 0);
        assert_eq!(json["jmlSubGroupHadir"], 0);
        assert_eq!(json["jmlSubGroup"], 1);
        assert_eq!(json["subGroupBelumHadir"][0]["nama_subgroup"], "Finance");
    }
}
