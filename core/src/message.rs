//! Wire protocol between actors and dashboard connections.
//!
//! Frames are JSON with a `type` tag. Outbound tags and payload field names
//! match the original dashboard protocol; inbound frames are the on-demand
//! query requests a privileged subscriber may send.

use crate::cache::StatsSummary;
use crate::types::{CheckIn, EventRecord, InvitedGroup};
use serde::{Deserialize, Serialize};

/// A frame sent from an actor to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One-shot baseline sent to every new subscriber before any broadcast.
    InitialStats {
        /// Current statistics summary.
        data: StatsSummary,
        /// The event record, absent until a load has succeeded.
        acara: Option<EventRecord>,
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// A check-in was recorded; full updated summary plus the new entry.
    RealtimeUpdate {
        /// Updated statistics summary.
        data: StatsSummary,
        /// The check-in that triggered this broadcast.
        new_entry: CheckIn,
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// An invitation was added; full updated summary plus the new entry.
    RealtimeUpdateUndangan {
        /// Updated statistics summary.
        data: StatsSummary,
        /// The invitation that triggered this broadcast.
        new_entry: InvitedGroup,
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// A new event exists; only ever emitted by the `"all"` partition.
    RealtimeUpdateAcara {
        /// The newly created event.
        new_acara: EventRecord,
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },
    /// Reply to a roster query.
    DataPresensi {
        /// Full attendance roster, oldest first.
        results: Vec<CheckIn>,
    },
    /// Reply to an event-list query.
    DataAcara {
        /// All events, newest first.
        results: Vec<EventRecord>,
    },
    /// Reply to an invitation-list query.
    DataUndangan {
        /// All invitations for the bound event.
        results: Vec<InvitedGroup>,
    },
}

/// A frame a subscriber sends to its actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request the full attendance roster.
    GetDataPresensi,
    /// Request the full event list.
    GetDataAcara,
    /// Request the full invitation list.
    GetDataUndangan,
}

/// The privileged on-demand query kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Full attendance roster for the bound event.
    Roster,
    /// Full event list.
    EventList,
    /// Full invitation list for the bound event.
    InvitationList,
}

impl From<ClientMessage> for QueryKind {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::GetDataPresensi => Self::Roster,
            ClientMessage::GetDataAcara => Self::EventList,
            ClientMessage::GetDataUndangan => Self::InvitationList,
        }
    }
}
