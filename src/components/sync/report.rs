use super::identifier::AppointmentId;
use std::fmt;

/// Phase of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Normalizing,
    Matching,
    Applying,
    Done,
    Failed,
}

impl SyncPhase {
    /// Runs move strictly forward; any non-terminal phase may fail
    pub fn can_transition_to(self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Normalizing)
                | (Normalizing, Matching)
                | (Matching, Applying)
                | (Applying, Done)
                | (Idle | Fetching | Normalizing | Matching | Applying, Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    Create,
    Update,
    Delete,
    RemoveDuplicate,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::Delete => "delete",
            SyncAction::RemoveDuplicate => "remove duplicate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Applied,
    /// Decided but not executed
    DryRun,
    Failed(String),
}

/// Result of one planned action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub appointment_id: AppointmentId,
    /// Calendar event id, for creates the id of the new event
    pub event_id: Option<String>,
    pub action: SyncAction,
    pub status: ItemStatus,
    /// A notification was due and could not be delivered
    pub notification_failed: bool,
}

/// Summary of one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub outcomes: Vec<ItemOutcome>,
    /// Matched pairs that needed no call
    pub unchanged: usize,
    /// Raw records dropped as malformed
    pub skipped: usize,
    pub phase: SyncPhase,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self {
            outcomes: Vec::new(),
            unchanged: 0,
            skipped: 0,
            phase: SyncPhase::Idle,
        }
    }
}

impl SyncReport {
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    fn applied(&self, action: SyncAction) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action == action && o.status == ItemStatus::Applied)
            .count()
    }

    pub fn created(&self) -> usize {
        self.applied(SyncAction::Create)
    }

    pub fn updated(&self) -> usize {
        self.applied(SyncAction::Update)
    }

    /// Deletions including removed duplicates
    pub fn deleted(&self) -> usize {
        self.applied(SyncAction::Delete) + self.applied(SyncAction::RemoveDuplicate)
    }

    /// Backend mutations that actually happened
    pub fn mutations(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == ItemStatus::Applied)
            .count()
    }

    pub fn failed(&self) -> Vec<&ItemOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ItemStatus::Failed(_)))
            .collect()
    }

    pub fn notification_failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.notification_failed).count()
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, updated {}, deleted {}, unchanged {}, skipped {}, failed {}",
            self.created(),
            self.updated(),
            self.deleted(),
            self.unchanged,
            self.skipped,
            self.failed().len()
        )?;

        let planned = self
            .outcomes
            .iter()
            .filter(|o| o.status == ItemStatus::DryRun)
            .count();
        if planned > 0 {
            write!(f, ", dry run {}", planned)?;
        }
        Ok(())
    }
}
