//! Domain types for events, invited groups, check-ins, and caller roles.
//!
//! Rust-side names are idiomatic English; the serde renames reproduce the
//! column names the original dashboards were built against, so existing
//! frontends keep working unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The isolation unit owning one actor instance.
///
/// Every event gets its own partition; the sentinel `All` partition carries
/// cross-event notifications (new events appearing) instead of per-event
/// attendance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    /// One event's attendance partition.
    Event(EventId),
    /// The cross-event aggregate partition (`"all"` on the wire).
    All,
}

impl PartitionKey {
    /// Parse a partition key from its query-parameter form: `"all"` or a
    /// decimal event id.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "all" {
            return Some(Self::All);
        }
        i64::from_str(raw).ok().map(|id| Self::Event(EventId(id)))
    }

    /// Whether this is the cross-event aggregate partition.
    #[must_use]
    pub const fn is_all(self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(id) => write!(f, "{id}"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Caller privilege, resolved by the gateway before anything reaches an actor.
///
/// Actors never authenticate; they only ever see one of these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unauthenticated public dashboard viewer.
    Guest,
    /// Event administrator.
    Admin,
    /// Super administrator.
    Super,
}

impl Role {
    /// Whether this role may issue on-demand detail queries.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Super)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest => write!(f, "guest"),
            Self::Admin => write!(f, "admin"),
            Self::Super => write!(f, "super"),
        }
    }
}

/// A scheduled event with a check-in window and a geofence.
///
/// Immutable after creation except through administrative correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event identifier.
    #[serde(rename = "id_acara")]
    pub id: EventId,
    /// Display name.
    #[serde(rename = "nama_acara")]
    pub name: String,
    /// Scheduled date (ISO-8601 on the wire).
    #[serde(rename = "tanggal")]
    pub date: chrono::NaiveDate,
    /// Scheduled start time.
    #[serde(rename = "jam")]
    pub start_time: chrono::NaiveTime,
    /// Venue description.
    #[serde(rename = "lokasi")]
    pub location: String,
    /// Geofence center latitude.
    pub latitude: f64,
    /// Geofence center longitude.
    pub longitude: f64,
    /// Geofence radius in meters.
    #[serde(rename = "radius")]
    pub radius_m: f64,
    /// Expected headcount.
    #[serde(rename = "jml_peserta")]
    pub expected_attendees: i64,
}

/// A named cohort invited to an event. Append-only per event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitedGroup {
    /// Invitation row identifier.
    #[serde(rename = "id_undangan")]
    pub id: i64,
    /// Owning event.
    #[serde(rename = "id_acara")]
    pub event_id: EventId,
    /// Group identifier.
    #[serde(rename = "id_subgroup")]
    pub group_id: i64,
    /// Group name; attendance is matched against this.
    #[serde(rename = "nama_subgroup")]
    pub group_name: String,
    /// Parent category name.
    #[serde(rename = "nama_group")]
    pub category_name: String,
}

/// A recorded attendance fact for one person at one event.
///
/// Append-only; `recorded_at` is server-assigned at insert time and therefore
/// monotonic non-decreasing per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Check-in row identifier.
    #[serde(rename = "id_presensi")]
    pub id: i64,
    /// Owning event.
    #[serde(rename = "id_acara")]
    pub event_id: EventId,
    /// Server-assigned timestamp, milliseconds since the Unix epoch.
    #[serde(rename = "waktu")]
    pub recorded_at: i64,
    /// Attendee name.
    #[serde(rename = "nama")]
    pub name: String,
    /// Declared group identifier.
    #[serde(rename = "id_subgroup")]
    pub group_id: i64,
    /// Declared group name.
    #[serde(rename = "nama_subgroup")]
    pub group_name: String,
    /// Job title, free text.
    #[serde(rename = "jabatan")]
    pub position: Option<String>,
    /// Employment-type label.
    #[serde(rename = "jenis_kepegawaian")]
    pub staff_type: Option<String>,
    /// Gender label.
    #[serde(rename = "gender")]
    pub gender: Option<String>,
    /// Contact phone number.
    #[serde(rename = "no_hp")]
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Reported latitude at check-in.
    pub latitude: Option<f64>,
    /// Reported longitude at check-in.
    pub longitude: Option<f64>,
    /// Submitting device identifier.
    #[serde(rename = "id_device")]
    pub device_id: Option<String>,
    /// Event display name, present when the row was read back joined.
    #[serde(rename = "nama_acara", skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
}

/// A group with its parent category, as served to admin form dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group identifier.
    #[serde(rename = "id_subgroup")]
    pub id: i64,
    /// Group name.
    #[serde(rename = "nama_subgroup")]
    pub name: String,
    /// Parent category identifier.
    #[serde(rename = "id_group")]
    pub category_id: i64,
    /// Parent category name.
    #[serde(rename = "nama_group")]
    pub category_name: String,
}

/// Check-in submission from the public form. The server assigns the row id
/// and timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckIn {
    /// Target event.
    #[serde(rename = "id_acara")]
    pub event_id: EventId,
    /// Attendee name.
    #[serde(rename = "nama")]
    pub name: String,
    /// Declared group identifier.
    #[serde(rename = "id_subgroup")]
    pub group_id: i64,
    /// Declared group name.
    #[serde(rename = "nama_subgroup")]
    pub group_name: String,
    /// Job title, free text.
    #[serde(rename = "jabatan")]
    pub position: Option<String>,
    /// Employment-type label.
    #[serde(rename = "jenis_kepegawaian")]
    pub staff_type: Option<String>,
    /// Gender label.
    pub gender: Option<String>,
    /// Contact phone number.
    #[serde(rename = "no_hp")]
    pub phone: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Reported latitude at submit time.
    pub latitude: Option<f64>,
    /// Reported longitude at submit time.
    pub longitude: Option<f64>,
    /// Submitting device identifier.
    #[serde(rename = "id_device")]
    pub device_id: Option<String>,
}

/// Invitation submission from the admin form.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewInvitation {
    /// Target event.
    #[serde(rename = "id_acara")]
    pub event_id: EventId,
    /// Invited group.
    #[serde(rename = "id_subgroup")]
    pub group_id: i64,
}

/// Event submission from the admin form. The server assigns the id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    /// Display name.
    #[serde(rename = "nama_acara")]
    pub name: String,
    /// Scheduled date.
    #[serde(rename = "tanggal")]
    pub date: chrono::NaiveDate,
    /// Scheduled start time.
    #[serde(rename = "jam")]
    pub start_time: chrono::NaiveTime,
    /// Venue description.
    #[serde(rename = "lokasi")]
    pub location: String,
    /// Geofence center latitude.
    pub latitude: f64,
    /// Geofence center longitude.
    pub longitude: f64,
    /// Geofence radius in meters.
    #[serde(rename = "radius")]
    pub radius_m: f64,
    /// Expected headcount.
    #[serde(rename = "jml_peserta")]
    pub expected_attendees: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;

    #[test]
    fn partition_key_parses_all_and_ids() {
        assert_eq!(PartitionKey::parse("all"), Some(PartitionKey::All));
        assert_eq!(
            PartitionKey::parse("42"),
            Some(PartitionKey::Event(EventId(42)))
        );
        assert_eq!(PartitionKey::parse(""), None);
        assert_eq!(PartitionKey::parse("everything"), None);
    }

    #[test]
    fn partition_key_display_round_trips() {
        for raw in ["all", "7"] {
            let key = PartitionKey::parse(raw).unwrap();
            assert_eq!(key.to_string(), raw);
        }
    }

    #[test]
    fn role_privilege() {
        assert!(!Role::Guest.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(Role::Super.is_privileged());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Super).unwrap(), "\"super\"");
        let parsed: Role = serde_json::from_str("\"guest\"").unwrap();
        assert_eq!(parsed, Role::Guest);
    }
}
