use super::matcher::match_events;
use super::models::Appointment;
use super::normalizer::normalize;
use super::plan::{PlannedAction, SyncPlan};
use super::report::{ItemOutcome, ItemStatus, SyncPhase, SyncReport};
use crate::components::pushover::{MessageFormatter, Notification};
use crate::components::{
    AppointmentSource, CalendarBackend, EventQuery, Notifier, Priority, RemoteEvent,
};
use crate::config::SyncSettings;
use crate::error::{Error, SyncResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs one reconciliation of portal appointments into the calendar
pub struct Reconciler {
    source: Arc<dyn AppointmentSource>,
    backend: Arc<dyn CalendarBackend>,
    notifier: Arc<dyn Notifier>,
    tz: Tz,
    dry_run: bool,
    priority: Priority,
    formatter: MessageFormatter,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn AppointmentSource>,
        backend: Arc<dyn CalendarBackend>,
        notifier: Arc<dyn Notifier>,
        settings: &SyncSettings,
    ) -> SyncResult<Self> {
        let tz = settings.tz()?;
        Ok(Self {
            source,
            backend,
            notifier,
            tz,
            dry_run: settings.dry_run,
            priority: Priority::new(settings.notification_priority),
            formatter: MessageFormatter::new(settings.notification_locale.clone(), tz),
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Sync against the current time
    pub async fn run(&self) -> SyncResult<SyncReport> {
        self.run_at(Utc::now()).await
    }

    /// Sync as if it were `now`.
    ///
    /// Fails only when one of the two inputs cannot be obtained. Errors of
    /// single items end up in the report.
    pub async fn run_at(&self, now: DateTime<Utc>) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();

        advance(&mut report, SyncPhase::Fetching);
        let batch = match self.source.fetch_appointments().await {
            Ok(batch) => batch,
            Err(e) => return Err(fail(&mut report, "fetching appointments", e)),
        };
        info!("Fetched {} appointments from the portal", batch.appointments.len());

        advance(&mut report, SyncPhase::Normalizing);
        let mut appointments = Vec::with_capacity(batch.appointments.len());
        for result in normalize(batch.appointments, now, self.tz) {
            match result {
                Ok(appointment) => appointments.push(appointment),
                Err(e) => {
                    warn!("Skipping appointment: {}", e);
                    report.skipped += 1;
                }
            }
        }
        // The portal lists in date order, so a cut scrape ends at its latest start
        let horizon = appointments
            .iter()
            .map(|a| a.start.with_timezone(&Utc))
            .max();

        advance(&mut report, SyncPhase::Matching);
        let events = match self.backend.list_events(&EventQuery::synced_from(now)).await {
            Ok(events) => events,
            Err(e) => return Err(fail(&mut report, "listing calendar events", e)),
        };
        debug!("Listed {} calendar events", events.len());

        let mut matched = match_events(appointments, events, now);
        if batch.truncated {
            matched.limit_deletions(horizon);
            if !matched.beyond_horizon.is_empty() {
                info!(
                    "Keeping {} events after the last scraped appointment",
                    matched.beyond_horizon.len()
                );
            }
        }

        let plan = SyncPlan::from_match(matched);
        report.unchanged = plan.unchanged.len();
        for id in &plan.unchanged {
            debug!("Unchanged: {}", id);
        }

        advance(&mut report, SyncPhase::Applying);
        if plan.is_empty() {
            info!("Calendar is up to date");
        }
        for action in plan.actions {
            let outcome = self.apply(action).await;
            report.record(outcome);
        }

        advance(&mut report, SyncPhase::Done);
        info!("Sync finished: {}", report);
        Ok(report)
    }

    async fn apply(&self, action: PlannedAction) -> ItemOutcome {
        let mut outcome = ItemOutcome {
            appointment_id: action.appointment_id(),
            event_id: action.event_id().map(str::to_string),
            action: action.action(),
            status: ItemStatus::Applied,
            notification_failed: false,
        };

        if self.dry_run {
            info!("[dry run] Would {}", action.describe());
            outcome.status = ItemStatus::DryRun;
            return outcome;
        }

        info!("{}", capitalize(&action.describe()));
        let result = match &action {
            PlannedAction::Create(appointment) => self.create(appointment).await.map(Some),
            PlannedAction::Update {
                appointment, event, ..
            } => self.update(appointment, event).await.map(|_| None),
            PlannedAction::Delete(event) | PlannedAction::RemoveDuplicate(event) => {
                self.backend.delete_event(&event.id).await.map(|_| None)
            }
        };

        match result {
            Ok(created_id) => {
                if created_id.is_some() {
                    outcome.event_id = created_id;
                }
                if let Some(notification) = self.notification_for(&action) {
                    outcome.notification_failed = !self.notify(notification).await;
                }
            }
            Err(e) => {
                warn!("Failed to {} {}: {}", outcome.action, outcome.appointment_id, e);
                outcome.status = ItemStatus::Failed(e.to_string());
            }
        }

        outcome
    }

    async fn create(&self, appointment: &Appointment) -> SyncResult<String> {
        let event = self.backend.create_event(&appointment.to_draft()).await?;
        debug!("Created event {} for {}", event.id, appointment.id);
        Ok(event.id)
    }

    /// Full overwrite of the event with the appointment's fields
    async fn update(&self, appointment: &Appointment, event: &RemoteEvent) -> SyncResult<()> {
        self.backend
            .update_event(&event.id, &appointment.to_draft())
            .await?;
        Ok(())
    }

    fn notification_for(&self, action: &PlannedAction) -> Option<Notification> {
        match action {
            PlannedAction::Create(appointment) => Some(self.formatter.added(appointment)),
            PlannedAction::Update { appointment, .. } => Some(self.formatter.updated(appointment)),
            PlannedAction::Delete(event) => Some(self.formatter.cancelled(event)),
            PlannedAction::RemoveDuplicate(_) => None,
        }
    }

    /// Returns false when the message could not be delivered
    async fn notify(&self, notification: Notification) -> bool {
        match self
            .notifier
            .send(&notification.title, &notification.body, self.priority)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send notification '{}': {}", notification.title, e);
                false
            }
        }
    }
}

fn advance(report: &mut SyncReport, next: SyncPhase) {
    debug_assert!(report.phase.can_transition_to(next));
    debug!("Sync phase {:?} -> {:?}", report.phase, next);
    report.phase = next;
}

fn fail(report: &mut SyncReport, step: &str, e: Error) -> Error {
    advance(report, SyncPhase::Failed);
    error!("Sync aborted while {}: {}", step, e);
    e
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
