/// One booking row as scraped from the portal, all fields verbatim
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RawAppointment {
    /// DD.MM.YYYY
    pub date: String,
    /// HH:MM
    pub start_time: String,
    /// HH:MM
    pub end_time: String,
    pub studio_name: String,
    pub address: String,
    /// e.g. "Regie: ...", empty when the row has none
    pub note: String,
}

impl RawAppointment {
    /// Short form for log lines
    pub fn summary_line(&self) -> String {
        format!(
            "{}, {} - {}, {}, {}",
            self.date, self.start_time, self.end_time, self.studio_name, self.address
        )
    }
}

/// Rows of one scrape, in portal order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppointmentBatch {
    pub appointments: Vec<RawAppointment>,
    /// The portal listed more rows than were kept
    pub truncated: bool,
}

impl AppointmentBatch {
    /// A complete scrape
    pub fn complete(appointments: Vec<RawAppointment>) -> Self {
        Self {
            appointments,
            truncated: false,
        }
    }

    /// Keep the first `max` rows, remembering whether any were cut
    pub fn capped(mut appointments: Vec<RawAppointment>, max: Option<usize>) -> Self {
        let truncated = match max {
            Some(max) if appointments.len() > max => {
                appointments.truncate(max);
                true
            }
            _ => false,
        };
        Self {
            appointments,
            truncated,
        }
    }
}
