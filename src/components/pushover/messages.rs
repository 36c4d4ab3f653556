use crate::components::sync::Appointment;
use crate::components::RemoteEvent;
use crate::utils::time::{format_date, format_time};
use chrono_tz::Tz;
use rust_i18n::t;

/// Title and body of one push message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Builds localized notification texts
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    locale: String,
    tz: Tz,
}

impl MessageFormatter {
    pub fn new(locale: impl Into<String>, tz: Tz) -> Self {
        Self {
            locale: locale.into(),
            tz,
        }
    }

    /// New appointment in the calendar
    pub fn added(&self, appointment: &Appointment) -> Notification {
        Notification {
            title: t!("appointment_added_title", locale = self.locale.as_str()).to_string(),
            body: self.appointment_body(appointment),
        }
    }

    /// Existing appointment with changed time, address or note
    pub fn updated(&self, appointment: &Appointment) -> Notification {
        Notification {
            title: t!("appointment_updated_title", locale = self.locale.as_str()).to_string(),
            body: self.appointment_body(appointment),
        }
    }

    /// Appointment gone from the portal, built from the calendar event alone
    pub fn cancelled(&self, event: &RemoteEvent) -> Notification {
        let when = match (event.start, event.end) {
            (Some(start), Some(end)) => {
                let start = start.with_timezone(&self.tz);
                let end = end.with_timezone(&self.tz);
                self.time_range(&format_date(&start), &format_time(&start), &format_time(&end))
            }
            (Some(start), None) => {
                let start = start.with_timezone(&self.tz);
                self.time_range(&format_date(&start), &format_time(&start), "?")
            }
            _ => t!("unknown_time", locale = self.locale.as_str()).to_string(),
        };

        let mut lines = vec![event.summary.clone(), when];
        push_if_present(&mut lines, &event.location);
        push_if_present(&mut lines, &event.description);

        Notification {
            title: t!("appointment_cancelled_title", locale = self.locale.as_str()).to_string(),
            body: lines.join("\n"),
        }
    }

    fn appointment_body(&self, appointment: &Appointment) -> String {
        let when = self.time_range(
            &appointment.date,
            &format_time(&appointment.start),
            &format_time(&appointment.end),
        );

        let mut lines = vec![appointment.studio_name.clone(), when];
        push_if_present(&mut lines, &appointment.address);
        push_if_present(&mut lines, &appointment.note);
        lines.join("\n")
    }

    fn time_range(&self, date: &str, start: &str, end: &str) -> String {
        t!(
            "time_range",
            locale = self.locale.as_str(),
            date = date,
            start = start,
            end = end
        )
        .to_string()
    }
}

fn push_if_present(lines: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        lines.push(value.to_string());
    }
}
