use super::api::EventDateTime;
use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Parse the timed start or end of a Google event.
///
/// All-day events only carry `date` and yield None, as do values that are
/// not RFC 3339.
pub fn parse_event_time(value: Option<&EventDateTime>) -> Option<DateTime<FixedOffset>> {
    let date_time = value?.date_time.as_deref()?;
    DateTime::parse_from_rfc3339(date_time).ok()
}

/// Format a timestamp for the API, always with an explicit offset
pub fn format_event_time(value: &DateTime<FixedOffset>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, false)
}
