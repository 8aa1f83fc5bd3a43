//! Terse constructors for domain records used across test suites.

use rollcall_core::{CheckIn, EventId, EventRecord, InvitedGroup};

/// A check-in for `group` at `event`, with placeholder personal fields.
#[must_use]
pub fn check_in(id: i64, event: i64, group: &str) -> CheckIn {
    CheckIn {
        id,
        event_id: EventId(event),
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

/// An invitation for `group` at `event`.
#[must_use]
pub fn invitation(id: i64, event: i64, group: &str) -> InvitedGroup {
    InvitedGroup {
        id,
        event_id: EventId(event),
        group_id: id,
        group_name: group.to_string(),
        category_name: "Directorate".to_string(),
    }
}

/// An event record with a fixed venue and schedule.
#[must_use]
pub fn event(id: i64, name: &str) -> EventRecord {
    EventRecord {
        id: EventId(id),
        name: name.to_string(),
        date: chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap_or_default(),
        start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        location: "Main Hall".to_string(),
        latitude: -6.2,
        longitude: 106.8,
        radius_m: 150.0,
        expected_attendees: 200,
    }
}
