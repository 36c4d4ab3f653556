use super::models::Appointment;
use crate::components::RemoteEvent;
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;

/// Event field compared against the appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
    Location,
    Description,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Start => "start",
            Field::End => "end",
            Field::Location => "location",
            Field::Description => "description",
        };
        f.write_str(name)
    }
}

/// One differing field, old is the calendar value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: Field,
    pub old: String,
    pub new: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?} -> {:?}", self.field, self.old, self.new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Unchanged,
    NeedsUpdate(Vec<FieldChange>),
}

impl Classification {
    pub fn needs_update(&self) -> bool {
        matches!(self, Classification::NeedsUpdate(_))
    }
}

/// Compare instants, not their textual offsets
fn same_instant(remote: Option<DateTime<FixedOffset>>, local: DateTime<Utc>) -> bool {
    remote.is_some_and(|remote| remote.with_timezone(&Utc) == local)
}

fn describe_time(value: Option<DateTime<FixedOffset>>) -> String {
    value.map(|v| v.to_rfc3339()).unwrap_or_else(|| "none".to_string())
}

/// Decide whether a synced event has to be overwritten with the appointment.
///
/// Start and end are compared as instants, location exactly, description
/// after trimming. A missing start or end on the event counts as a difference.
pub fn classify(appointment: &Appointment, event: &RemoteEvent) -> Classification {
    let mut changes = Vec::new();

    let start = appointment.start.with_timezone(&Utc);
    if !same_instant(event.start, start) {
        changes.push(FieldChange {
            field: Field::Start,
            old: describe_time(event.start),
            new: appointment.start.fixed_offset().to_rfc3339(),
        });
    }

    let end = appointment.end.with_timezone(&Utc);
    if !same_instant(event.end, end) {
        changes.push(FieldChange {
            field: Field::End,
            old: describe_time(event.end),
            new: appointment.end.fixed_offset().to_rfc3339(),
        });
    }

    if event.location != appointment.address {
        changes.push(FieldChange {
            field: Field::Location,
            old: event.location.clone(),
            new: appointment.address.clone(),
        });
    }

    if event.description.trim() != appointment.note.trim() {
        changes.push(FieldChange {
            field: Field::Description,
            old: event.description.clone(),
            new: appointment.note.clone(),
        });
    }

    if changes.is_empty() {
        Classification::Unchanged
    } else {
        Classification::NeedsUpdate(changes)
    }
}
