use super::models::Appointment;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Separator between the hashed fields
pub const ID_DELIMITER: &str = "_";

/// Number of digest bytes kept, 128 bits
const ID_BYTES: usize = 16;

/// Stable identifier correlating an appointment with its calendar event.
///
/// Derived from date, studio name and note only, so a corrected time or
/// address keeps the identity and shows up as an update.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppointmentId(String);

impl AppointmentId {
    /// Hash `date_studio_note` into a 32-character hex id
    pub fn derive(date: &str, studio_name: &str, note: &str) -> Self {
        let input = [date, studio_name, note].join(ID_DELIMITER);
        let digest = Sha256::digest(input.as_bytes());
        AppointmentId(hex::encode(&digest[..ID_BYTES]))
    }

    /// Wrap an id read back from event metadata
    pub fn from_stored(value: &str) -> Self {
        AppointmentId(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Separates a note from its occurrence number, never part of scraped text
pub const OCCURRENCE_DELIMITER: char = '\u{1f}';

/// Assigns distinct ids to double bookings as appointments stream past.
///
/// The first appointment with a given id keeps it. The n-th further one
/// (n >= 2, in scrape order) is re-derived from its note plus
/// [`OCCURRENCE_DELIMITER`] and `n`. Every parsed appointment has to pass
/// through, including ones that already started, or later occurrences
/// would shift down.
#[derive(Debug, Default)]
pub struct Disambiguator {
    seen: HashMap<AppointmentId, usize>,
}

impl Disambiguator {
    pub fn assign(&mut self, appointment: &mut Appointment) {
        let count = self.seen.entry(appointment.id.clone()).or_insert(0);
        *count += 1;

        if *count > 1 {
            let id = AppointmentId::derive(
                &appointment.date,
                &appointment.studio_name,
                &occurrence_note(&appointment.note, *count),
            );
            warn!(
                "Double booking at {} on {}, using id {} for occurrence {}",
                appointment.studio_name, appointment.date, id, count
            );
            appointment.id = id;
        }
    }
}

/// Hash input for the n-th occurrence of a note
pub fn occurrence_note(note: &str, occurrence: usize) -> String {
    format!("{}{}{}", note, OCCURRENCE_DELIMITER, occurrence)
}

/// Give double bookings in a complete scrape distinct ids
pub fn disambiguate(appointments: &mut [Appointment]) {
    let mut disambiguator = Disambiguator::default();
    for appointment in appointments.iter_mut() {
        disambiguator.assign(appointment);
    }
}
