use crate::error::{config_error, env_error, SyncResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default booking portal
pub const DEFAULT_PORTAL_URL: &str = "https://login.synchron.de";

/// Default timezone for parsing appointments and displaying events
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Default location of the Google OAuth token file
pub const DEFAULT_TOKEN_PATH: &str = "google_token.json";

/// Default location of the optional settings file
pub const SETTINGS_PATH: &str = "config/studiosync.toml";

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub portal: PortalConfig,
    pub google: GoogleConfig,
    /// Pushover credentials, notifications are disabled when absent
    pub pushover: Option<PushoverConfig>,
    pub sync: SyncSettings,
}

/// Booking portal login
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Only keep the first N scraped rows
    pub max_appointments: Option<usize>,
}

/// Google Calendar API access
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub calendar_id: String,
    pub token_path: PathBuf,
}

/// Pushover API access
#[derive(Debug, Clone)]
pub struct PushoverConfig {
    pub app_token: String,
    pub user_key: String,
}

/// Non-secret settings, can come from `config/studiosync.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// IANA timezone name
    pub timezone: String,
    /// Seconds between runs, 0 runs once and exits
    pub sync_interval_secs: u64,
    /// Log decisions without touching the calendar
    pub dry_run: bool,
    /// Pushover priority, -2 to 2
    pub notification_priority: i8,
    /// Locale for notification texts
    pub notification_locale: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            sync_interval_secs: 0,
            dry_run: false,
            notification_priority: 0,
            notification_locale: "de".to_string(),
        }
    }
}

impl SyncSettings {
    /// Parse the configured timezone
    pub fn tz(&self) -> SyncResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    /// Read settings from a TOML file, missing keys fall back to defaults
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let content = fs::read_to_string(path)?;
        let settings = toml::from_str::<SyncSettings>(&content)?;
        Ok(settings)
    }

    /// Apply environment overrides on top of the current values
    fn apply_env(&mut self) -> SyncResult<()> {
        if let Ok(timezone) = env::var("TIMEZONE") {
            self.timezone = timezone;
        }
        if let Some(interval) = parse_env::<u64>("SYNC_INTERVAL_SECS")? {
            self.sync_interval_secs = interval;
        }
        if let Some(dry_run) = parse_env_bool("DRY_RUN")? {
            self.dry_run = dry_run;
        }
        if let Some(priority) = parse_env::<i8>("NOTIFICATION_PRIORITY")? {
            self.notification_priority = priority;
        }
        if let Ok(locale) = env::var("NOTIFICATION_LOCALE") {
            self.notification_locale = locale;
        }
        Ok(())
    }

    /// Check values that can be wrong in a settings file
    pub fn validate(&self) -> SyncResult<()> {
        self.tz()?;
        if !(-2..=2).contains(&self.notification_priority) {
            return Err(config_error("NOTIFICATION_PRIORITY must be between -2 and 2"));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment and the optional settings file
    pub fn load() -> SyncResult<Self> {
        // Credentials live in credentials.env, anything else may be in .env
        dotenvy::from_filename("credentials.env").ok();
        dotenv().ok();

        let mut sync = if Path::new(SETTINGS_PATH).exists() {
            SyncSettings::from_file(Path::new(SETTINGS_PATH))?
        } else {
            SyncSettings::default()
        };
        sync.apply_env()?;
        sync.validate()?;

        let portal = PortalConfig {
            base_url: env::var("PORTAL_BASE_URL").unwrap_or_else(|_| DEFAULT_PORTAL_URL.to_string()),
            username: required("PORTAL_USERNAME")?,
            password: required("PORTAL_PASSWORD")?,
            max_appointments: parse_env::<usize>("PORTAL_MAX_APPOINTMENTS")?,
        };

        let google = GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            calendar_id: required("GOOGLE_CALENDAR_ID")?,
            token_path: env::var("GOOGLE_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH)),
        };

        let pushover = match (env::var("PUSHOVER_TOKEN"), env::var("PUSHOVER_USER")) {
            (Ok(app_token), Ok(user_key)) if !app_token.is_empty() && !user_key.is_empty() => {
                Some(PushoverConfig { app_token, user_key })
            }
            _ => None,
        };

        Ok(Config {
            portal,
            google,
            pushover,
            sync,
        })
    }
}

impl GoogleConfig {
    /// Load only the Google part, used by the token binary
    pub fn load() -> SyncResult<Self> {
        dotenvy::from_filename("credentials.env").ok();
        dotenv().ok();

        Ok(GoogleConfig {
            client_id: required("GOOGLE_CLIENT_ID")?,
            client_secret: required("GOOGLE_CLIENT_SECRET")?,
            calendar_id: env::var("GOOGLE_CALENDAR_ID").unwrap_or_else(|_| "primary".to_string()),
            token_path: env::var("GOOGLE_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_PATH)),
        })
    }
}

fn required(var: &str) -> SyncResult<String> {
    env::var(var).map_err(|_| env_error(var))
}

fn parse_env<T: std::str::FromStr>(var: &str) -> SyncResult<Option<T>> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| env_error(&format!("Invalid {} format", var))),
        _ => Ok(None),
    }
}

fn parse_env_bool(var: &str) -> SyncResult<Option<bool>> {
    match env::var(var) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(env_error(&format!("Invalid {} format", var))),
        },
        Err(_) => Ok(None),
    }
}
