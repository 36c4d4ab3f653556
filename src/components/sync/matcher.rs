use super::identifier::AppointmentId;
use super::models::Appointment;
use crate::components::RemoteEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

/// Correspondence between appointments and synced events, keyed by appointment id.
///
/// `to_create`, `to_delete`, `to_check` and `beyond_horizon` partition the
/// union of both id sets.
#[derive(Debug, Default)]
pub struct EventMatch {
    pub appointments: HashMap<AppointmentId, Appointment>,
    pub events: HashMap<AppointmentId, RemoteEvent>,
    /// Only in the appointments, in scrape order
    pub to_create: Vec<AppointmentId>,
    /// Only in the calendar, in listing order
    pub to_delete: Vec<AppointmentId>,
    /// In both, in scrape order
    pub to_check: Vec<AppointmentId>,
    /// Further synced events carrying an id that is already matched
    pub duplicates: Vec<RemoteEvent>,
    /// Only in the calendar, but later than a truncated scrape reaches
    pub beyond_horizon: Vec<AppointmentId>,
}

impl EventMatch {
    /// Matched pairs of `to_check`
    pub fn pairs(&self) -> impl Iterator<Item = (&Appointment, &RemoteEvent)> + '_ {
        self.to_check
            .iter()
            .filter_map(|id| Some((self.appointments.get(id)?, self.events.get(id)?)))
    }

    /// Restrict deletions to events starting at or before `horizon`.
    ///
    /// Used when the scrape was cut off: an event after the last scraped
    /// appointment may well still be booked. With no horizon nothing is
    /// deleted.
    pub fn limit_deletions(&mut self, horizon: Option<DateTime<Utc>>) {
        let events = &self.events;
        let (keep, beyond): (Vec<_>, Vec<_>) = self.to_delete.drain(..).partition(|id| {
            let start = events.get(id).and_then(|e| e.start);
            match (horizon, start) {
                (Some(horizon), Some(start)) => start.with_timezone(&Utc) <= horizon,
                _ => false,
            }
        });
        self.to_delete = keep;
        self.beyond_horizon.extend(beyond);
    }
}

/// Whether a remote event takes part in matching: created by the sync,
/// carrying an appointment id, and starting at or after `now`.
pub fn is_sync_candidate(event: &RemoteEvent, now: DateTime<Utc>) -> bool {
    event.is_synced()
        && event.appointment_id().is_some()
        && event.start.is_some_and(|start| start.with_timezone(&Utc) >= now)
}

/// Build the id correspondence between fresh appointments and calendar events.
///
/// Events without the sync marker are dropped before anything else, so they
/// can never end up in `to_delete` or `to_check`.
pub fn match_events(
    appointments: Vec<Appointment>,
    events: Vec<RemoteEvent>,
    now: DateTime<Utc>,
) -> EventMatch {
    let mut matched = EventMatch::default();
    let mut appointment_order = Vec::new();

    for appointment in appointments {
        if matched.appointments.contains_key(&appointment.id) {
            warn!(
                "Ignoring second appointment with id {} ({} on {})",
                appointment.id, appointment.studio_name, appointment.date
            );
            continue;
        }
        appointment_order.push(appointment.id.clone());
        matched.appointments.insert(appointment.id.clone(), appointment);
    }

    let mut event_order = Vec::new();
    for event in events.into_iter().filter(|e| is_sync_candidate(e, now)) {
        let Some(id) = event.appointment_id().map(AppointmentId::from_stored) else {
            continue;
        };
        if matched.events.contains_key(&id) {
            matched.duplicates.push(event);
            continue;
        }
        event_order.push(id.clone());
        matched.events.insert(id, event);
    }

    for id in appointment_order {
        if matched.events.contains_key(&id) {
            matched.to_check.push(id);
        } else {
            matched.to_create.push(id);
        }
    }

    for id in event_order {
        if !matched.appointments.contains_key(&id) {
            matched.to_delete.push(id);
        }
    }

    matched
}
