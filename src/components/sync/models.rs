use super::identifier::AppointmentId;
use crate::components::google_calendar::models::{
    APPOINTMENT_ID_KEY, SYNC_MARKER_KEY, SYNC_MARKER_VALUE,
};
use crate::components::{EventDraft, RawAppointment};
use crate::error::{parse_error, SyncResult};
use crate::utils::time::{localize, naive_datetime, parse_portal_date};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use std::collections::HashMap;

/// A scraped appointment with real timestamps and its identifier
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub studio_name: String,
    pub address: String,
    pub note: String,
    /// Portal date string the id is derived from
    pub date: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub id: AppointmentId,
}

impl Appointment {
    /// Parse a raw record in the given timezone.
    ///
    /// An end at or before the start is read as the next day.
    pub fn from_raw(raw: RawAppointment, tz: Tz) -> SyncResult<Self> {
        let date_str = raw.date.trim();
        let date = parse_portal_date(date_str).ok_or_else(|| {
            parse_error(&format!("Invalid date {:?} in [{}]", raw.date, raw.summary_line()))
        })?;

        let start = naive_datetime(date, &raw.start_time).ok_or_else(|| {
            parse_error(&format!("Invalid start time {:?} in [{}]", raw.start_time, raw.summary_line()))
        })?;
        let mut end = naive_datetime(date, &raw.end_time).ok_or_else(|| {
            parse_error(&format!("Invalid end time {:?} in [{}]", raw.end_time, raw.summary_line()))
        })?;
        if end <= start {
            end += Duration::days(1);
        }

        let studio_name = raw.studio_name.trim().to_string();
        let note = raw.note.trim().to_string();
        let id = AppointmentId::derive(date_str, &studio_name, &note);

        Ok(Appointment {
            start: localize(start, tz)?,
            end: localize(end, tz)?,
            address: raw.address.trim().to_string(),
            date: date_str.to_string(),
            studio_name,
            note,
            id,
        })
    }

    /// Event fields for this appointment, tagged with the sync marker and id
    pub fn to_draft(&self) -> EventDraft {
        let mut private_metadata = HashMap::new();
        private_metadata.insert(SYNC_MARKER_KEY.to_string(), SYNC_MARKER_VALUE.to_string());
        private_metadata.insert(APPOINTMENT_ID_KEY.to_string(), self.id.to_string());

        EventDraft {
            summary: self.studio_name.clone(),
            location: self.address.clone(),
            description: self.note.clone(),
            start: self.start.fixed_offset(),
            end: self.end.fixed_offset(),
            time_zone: self.start.timezone().name().to_string(),
            private_metadata,
        }
    }
}
