pub mod models;
pub mod parser;
mod session;

pub use models::{AppointmentBatch, RawAppointment};
pub use session::PortalScraper;
