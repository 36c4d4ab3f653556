use crate::error::SyncResult;
use async_trait::async_trait;

// Export components
pub mod google_calendar;
pub mod portal;
pub mod pushover;
pub mod sync;

pub use google_calendar::{EventDraft, EventQuery, GoogleCalendarClient, RemoteEvent};
pub use portal::{AppointmentBatch, PortalScraper, RawAppointment};
pub use pushover::{DisabledNotifier, PushoverNotifier};

/// Source of scraped appointments
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    /// Log in and return the current booking rows.
    ///
    /// Fails with `Error::Auth` when the portal rejects the login.
    async fn fetch_appointments(&self) -> SyncResult<AppointmentBatch>;
}

/// Calendar the appointments are synced into
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<RemoteEvent>>;

    async fn create_event(&self, draft: &EventDraft) -> SyncResult<RemoteEvent>;

    /// Overwrite all fields of an event, `Error::NotFound` if the id is unknown
    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> SyncResult<RemoteEvent>;

    /// `Error::NotFound` if the event is already gone
    async fn delete_event(&self, event_id: &str) -> SyncResult<()>;
}

/// Push notification priority, always within -2..=2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Priority(i8);

impl Priority {
    pub const LOWEST: Priority = Priority(-2);
    pub const NORMAL: Priority = Priority(0);
    pub const EMERGENCY: Priority = Priority(2);

    /// Clamp any value into the valid range
    pub fn new(value: i8) -> Self {
        Priority(value.clamp(-2, 2))
    }

    pub fn value(self) -> i8 {
        self.0
    }
}

/// Fire-and-forget push messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str, priority: Priority) -> SyncResult<()>;
}
