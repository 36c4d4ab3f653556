use super::identifier::Disambiguator;
use super::models::Appointment;
use crate::components::RawAppointment;
use crate::error::SyncResult;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Turn raw records into appointments, dropping those that already started.
///
/// Lazy and order-preserving. A malformed record yields an `Err` for that
/// record only, the caller decides to log and skip it. An appointment starting
/// exactly at `now` is kept.
///
/// Double bookings are told apart before the start filter runs, so the ids
/// of later occurrences stay the same while the day goes on.
pub fn normalize<I>(
    raws: I,
    now: DateTime<Utc>,
    tz: Tz,
) -> impl Iterator<Item = SyncResult<Appointment>>
where
    I: IntoIterator<Item = RawAppointment>,
{
    let mut disambiguator = Disambiguator::default();

    raws.into_iter()
        .map(move |raw| Appointment::from_raw(raw, tz))
        .map(move |result| {
            result.map(|mut appointment| {
                disambiguator.assign(&mut appointment);
                appointment
            })
        })
        .filter(move |result| match result {
            Ok(appointment) => appointment.start.with_timezone(&Utc) >= now,
            Err(_) => true,
        })
}
