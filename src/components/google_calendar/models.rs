use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashMap;

/// Private metadata key flagging events created by the sync
pub const SYNC_MARKER_KEY: &str = "sync_marker";
/// Value of [`SYNC_MARKER_KEY`] on synced events
pub const SYNC_MARKER_VALUE: &str = "true";
/// Private metadata key holding the appointment identifier
pub const APPOINTMENT_ID_KEY: &str = "appointment_id";

/// Calendar event as stored by the backend
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteEvent {
    /// Backend-assigned id
    pub id: String,
    pub summary: String,
    pub location: String,
    pub description: String,
    /// None for all-day events
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub private_metadata: HashMap<String, String>,
}

impl RemoteEvent {
    /// Whether this event was created by the sync
    pub fn is_synced(&self) -> bool {
        self.private_metadata
            .get(SYNC_MARKER_KEY)
            .is_some_and(|v| v == SYNC_MARKER_VALUE)
    }

    /// The appointment id stored in the event, if any
    pub fn appointment_id(&self) -> Option<&str> {
        self.private_metadata
            .get(APPOINTMENT_ID_KEY)
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

/// Full field set for creating or overwriting an event
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA name used for display
    pub time_zone: String,
    pub private_metadata: HashMap<String, String>,
}

/// Filter for listing events
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: Option<DateTime<Utc>>,
    /// Only events whose private metadata has this key and value
    pub private_filter: Option<(String, String)>,
}

impl EventQuery {
    /// Synced events from `now` onwards
    pub fn synced_from(now: DateTime<Utc>) -> Self {
        Self {
            time_min: now,
            time_max: None,
            private_filter: Some((SYNC_MARKER_KEY.to_string(), SYNC_MARKER_VALUE.to_string())),
        }
    }
}
