pub mod api;
mod client;
pub mod models;
mod time;
pub mod token;

pub use client::GoogleCalendarClient;
pub use models::{EventDraft, EventQuery, RemoteEvent};
