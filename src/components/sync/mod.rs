//! Reconciliation of scraped appointments with the calendar.
//!
//! Raw rows are normalized into [`Appointment`]s, matched by [`AppointmentId`]
//! against the synced calendar events, classified and applied by the
//! [`Reconciler`].

pub mod classifier;
mod driver;
pub mod identifier;
pub mod matcher;
pub mod models;
pub mod normalizer;
pub mod plan;
pub mod report;

pub use classifier::{classify, Classification, Field, FieldChange};
pub use driver::Reconciler;
pub use identifier::{disambiguate, AppointmentId};
pub use matcher::{match_events, EventMatch};
pub use models::Appointment;
pub use normalizer::normalize;
pub use plan::{PlannedAction, SyncPlan};
pub use report::{ItemOutcome, ItemStatus, SyncAction, SyncPhase, SyncReport};
