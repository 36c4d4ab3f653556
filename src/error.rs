use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Could not parse appointment: {0}")]
    #[diagnostic(code(studiosync::scrape_parse))]
    ScrapeParse(String),

    #[error("Portal login failed: {0}")]
    #[diagnostic(
        code(studiosync::auth),
        help("Check PORTAL_USERNAME and PORTAL_PASSWORD")
    )]
    Auth(String),

    #[error("Portal error: {0}")]
    #[diagnostic(code(studiosync::portal))]
    Portal(String),

    #[error("Calendar API error: {0}")]
    #[diagnostic(code(studiosync::calendar))]
    Calendar(String),

    #[error("Calendar event not found: {0}")]
    #[diagnostic(code(studiosync::not_found))]
    NotFound(String),

    #[error("Notification error: {0}")]
    #[diagnostic(code(studiosync::notification))]
    Notification(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(studiosync::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(studiosync::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(studiosync::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(studiosync::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(studiosync::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(studiosync::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("Invalid settings file: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create parse errors for a single scraped record
pub fn parse_error(message: &str) -> Error {
    Error::ScrapeParse(message.to_string())
}

/// Helper to create portal login errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create portal errors
pub fn portal_error(message: &str) -> Error {
    Error::Portal(message.to_string())
}

/// Helper to create calendar errors
pub fn calendar_error(message: &str) -> Error {
    Error::Calendar(message.to_string())
}

/// Helper to create notification errors
pub fn notification_error(message: &str) -> Error {
    Error::Notification(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
