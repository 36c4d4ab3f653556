//! Test doubles for the portal, the calendar and the notifier
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use studiosync::components::google_calendar::models::{
    APPOINTMENT_ID_KEY, SYNC_MARKER_KEY, SYNC_MARKER_VALUE,
};
use studiosync::components::{
    AppointmentBatch, AppointmentSource, CalendarBackend, EventDraft, EventQuery, Notifier,
    Priority, RawAppointment, RemoteEvent,
};
use studiosync::config::SyncSettings;
use studiosync::error::{auth_error, calendar_error, notification_error, Error, SyncResult};

/// Fixed "now" before every test appointment
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn test_settings() -> SyncSettings {
    SyncSettings {
        notification_locale: "en".to_string(),
        ..SyncSettings::default()
    }
}

pub fn raw(date: &str, start: &str, end: &str, studio: &str, address: &str, note: &str) -> RawAppointment {
    RawAppointment {
        date: date.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        studio_name: studio.to_string(),
        address: address.to_string(),
        note: note.to_string(),
    }
}

pub fn berlin(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap()
}

/// A synced event as the calendar would return it
pub fn synced_event(
    id: &str,
    appointment_id: &str,
    summary: &str,
    start: &str,
    end: &str,
    location: &str,
    description: &str,
) -> RemoteEvent {
    let mut private_metadata = HashMap::new();
    private_metadata.insert(SYNC_MARKER_KEY.to_string(), SYNC_MARKER_VALUE.to_string());
    private_metadata.insert(APPOINTMENT_ID_KEY.to_string(), appointment_id.to_string());
    RemoteEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        location: location.to_string(),
        description: description.to_string(),
        start: Some(berlin(start)),
        end: Some(berlin(end)),
        private_metadata,
    }
}

/// Portal double returning a fixed list, or a login failure
pub struct StaticSource {
    batch: AppointmentBatch,
    reject_login: bool,
}

impl StaticSource {
    pub fn new(appointments: Vec<RawAppointment>) -> Self {
        Self {
            batch: AppointmentBatch::complete(appointments),
            reject_login: false,
        }
    }

    /// A scrape cut off after these rows
    pub fn truncated(appointments: Vec<RawAppointment>) -> Self {
        Self {
            batch: AppointmentBatch {
                appointments,
                truncated: true,
            },
            reject_login: false,
        }
    }

    pub fn rejecting_login() -> Self {
        Self {
            batch: AppointmentBatch::default(),
            reject_login: true,
        }
    }
}

#[async_trait]
impl AppointmentSource for StaticSource {
    async fn fetch_appointments(&self) -> SyncResult<AppointmentBatch> {
        if self.reject_login {
            return Err(auth_error("wrong password"));
        }
        Ok(self.batch.clone())
    }
}

/// One mutating call made against the calendar double
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCall {
    Create(EventDraft),
    Update(String, EventDraft),
    Delete(String),
}

/// In-memory calendar that records every mutation.
///
/// Created events are stored, so a second run sees the result of the first.
#[derive(Default)]
pub struct RecordingBackend {
    events: Mutex<Vec<RemoteEvent>>,
    calls: Mutex<Vec<CalendarCall>>,
    queries: Mutex<Vec<EventQuery>>,
    failing_ids: Mutex<Vec<String>>,
    fail_creates_for: Mutex<Vec<String>>,
    fail_listing: bool,
    next_id: Mutex<usize>,
}

impl RecordingBackend {
    pub fn with_events(events: Vec<RemoteEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Default::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Default::default()
        }
    }

    /// Updates and deletes of this event id fail
    pub fn fail_event(&self, event_id: &str) {
        self.failing_ids.lock().unwrap().push(event_id.to_string());
    }

    /// Creates for this studio name fail
    pub fn fail_create_for(&self, summary: &str) {
        self.fail_creates_for.lock().unwrap().push(summary.to_string());
    }

    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<RemoteEvent> {
        self.events.lock().unwrap().clone()
    }

    fn from_draft(id: String, draft: &EventDraft) -> RemoteEvent {
        RemoteEvent {
            id,
            summary: draft.summary.clone(),
            location: draft.location.clone(),
            description: draft.description.clone(),
            start: Some(draft.start),
            end: Some(draft.end),
            private_metadata: draft.private_metadata.clone(),
        }
    }

    fn check_failing(&self, event_id: &str) -> SyncResult<()> {
        if self.failing_ids.lock().unwrap().iter().any(|id| id == event_id) {
            return Err(calendar_error(&format!("HTTP 500 for {}", event_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarBackend for RecordingBackend {
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<RemoteEvent>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_listing {
            return Err(calendar_error("HTTP 503"));
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create_event(&self, draft: &EventDraft) -> SyncResult<RemoteEvent> {
        self.calls.lock().unwrap().push(CalendarCall::Create(draft.clone()));
        if self.fail_creates_for.lock().unwrap().contains(&draft.summary) {
            return Err(calendar_error("HTTP 500"));
        }

        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            format!("created-{}", next_id)
        };
        let event = Self::from_draft(id, draft);
        self.events.lock().unwrap().push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> SyncResult<RemoteEvent> {
        self.calls
            .lock()
            .unwrap()
            .push(CalendarCall::Update(event_id.to_string(), draft.clone()));
        self.check_failing(event_id)?;

        let mut events = self.events.lock().unwrap();
        let slot = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| Error::NotFound(event_id.to_string()))?;
        *slot = Self::from_draft(event_id.to_string(), draft);
        Ok(slot.clone())
    }

    async fn delete_event(&self, event_id: &str) -> SyncResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(CalendarCall::Delete(event_id.to_string()));
        self.check_failing(event_id)?;

        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return Err(Error::NotFound(event_id.to_string()));
        }
        Ok(())
    }
}

/// A message handed to the notifier double
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub title: String,
    pub body: String,
    pub priority: Priority,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, title: &str, body: &str, priority: Priority) -> SyncResult<()> {
        self.sent.lock().unwrap().push(SentMessage {
            title: title.to_string(),
            body: body.to_string(),
            priority,
        });
        if self.fail {
            return Err(notification_error("HTTP 429"));
        }
        Ok(())
    }
}
