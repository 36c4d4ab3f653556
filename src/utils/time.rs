use crate::error::{parse_error, SyncResult};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

/// Date format used by the booking portal
pub const PORTAL_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Parse a portal date in DD.MM.YYYY format
pub fn parse_portal_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    // chrono accepts single-digit fields, the portal never sends them
    if date_str.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(date_str, PORTAL_DATE_FORMAT).ok()
}

/// Combine a portal date and HH:MM time
pub fn naive_datetime(date: NaiveDate, time_str: &str) -> Option<NaiveDateTime> {
    let (hour, minute) = parse_time(time_str)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// Attach a timezone to a wall-clock time
pub fn localize(naive: NaiveDateTime, tz: Tz) -> SyncResult<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        // Clocks going back: the first occurrence
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(parse_error(&format!(
            "Local time {} does not exist in {}",
            naive, tz
        ))),
    }
}

/// Format a date the way the portal shows it
pub fn format_date<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format(PORTAL_DATE_FORMAT).to_string()
}

/// Format a time as HH:MM
pub fn format_time<T: TimeZone>(dt: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    dt.format("%H:%M").to_string()
}
