use super::classifier::{classify, Classification, FieldChange};
use super::identifier::AppointmentId;
use super::matcher::EventMatch;
use super::models::Appointment;
use super::report::SyncAction;
use crate::components::RemoteEvent;

/// One backend mutation decided for this run
#[derive(Debug, Clone)]
pub enum PlannedAction {
    Create(Appointment),
    Update {
        appointment: Appointment,
        event: RemoteEvent,
        changes: Vec<FieldChange>,
    },
    Delete(RemoteEvent),
    /// Extra synced event for an id that is already matched
    RemoveDuplicate(RemoteEvent),
}

impl PlannedAction {
    pub fn action(&self) -> SyncAction {
        match self {
            PlannedAction::Create(_) => SyncAction::Create,
            PlannedAction::Update { .. } => SyncAction::Update,
            PlannedAction::Delete(_) => SyncAction::Delete,
            PlannedAction::RemoveDuplicate(_) => SyncAction::RemoveDuplicate,
        }
    }

    pub fn appointment_id(&self) -> AppointmentId {
        match self {
            PlannedAction::Create(appointment) | PlannedAction::Update { appointment, .. } => {
                appointment.id.clone()
            }
            PlannedAction::Delete(event) | PlannedAction::RemoveDuplicate(event) => {
                AppointmentId::from_stored(event.appointment_id().unwrap_or_default())
            }
        }
    }

    /// Calendar event id, None until a created event exists
    pub fn event_id(&self) -> Option<&str> {
        match self {
            PlannedAction::Create(_) => None,
            PlannedAction::Update { event, .. }
            | PlannedAction::Delete(event)
            | PlannedAction::RemoveDuplicate(event) => Some(event.id.as_str()),
        }
    }

    /// Human-readable decision for the log
    pub fn describe(&self) -> String {
        match self {
            PlannedAction::Create(a) => {
                format!("create {} on {} {}", a.studio_name, a.date, a.start.format("%H:%M"))
            }
            PlannedAction::Update {
                appointment,
                changes,
                ..
            } => {
                let changes: Vec<String> = changes.iter().map(ToString::to_string).collect();
                format!(
                    "update {} on {} ({})",
                    appointment.studio_name,
                    appointment.date,
                    changes.join(", ")
                )
            }
            PlannedAction::Delete(e) => format!("delete {} ({})", e.summary, e.id),
            PlannedAction::RemoveDuplicate(e) => format!("remove duplicate {} ({})", e.summary, e.id),
        }
    }
}

/// Everything one run will do, in execution order
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub actions: Vec<PlannedAction>,
    /// Matched pairs that need no call
    pub unchanged: Vec<AppointmentId>,
}

impl SyncPlan {
    /// Classify every matched pair and order the work: creates, updates,
    /// deletes, then duplicate removals.
    pub fn from_match(mut matched: EventMatch) -> Self {
        let mut plan = SyncPlan::default();

        for id in &matched.to_create {
            if let Some(appointment) = matched.appointments.remove(id) {
                plan.actions.push(PlannedAction::Create(appointment));
            }
        }

        for id in &matched.to_check {
            let (Some(appointment), Some(event)) =
                (matched.appointments.remove(id), matched.events.remove(id))
            else {
                continue;
            };
            match classify(&appointment, &event) {
                Classification::Unchanged => plan.unchanged.push(id.clone()),
                Classification::NeedsUpdate(changes) => plan.actions.push(PlannedAction::Update {
                    appointment,
                    event,
                    changes,
                }),
            }
        }

        for id in &matched.to_delete {
            if let Some(event) = matched.events.remove(id) {
                plan.actions.push(PlannedAction::Delete(event));
            }
        }

        plan.actions.extend(
            matched
                .duplicates
                .drain(..)
                .map(PlannedAction::RemoveDuplicate),
        );

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
