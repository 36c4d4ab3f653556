use super::models::AppointmentBatch;
use super::parser::{is_logged_in, parse_appointments, parse_csrf_token};
use crate::components::AppointmentSource;
use crate::config::PortalConfig;
use crate::error::{auth_error, config_error, portal_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const LOGIN_PATH: &str = "/login?is_app=0";
const EVENTS_PATH: &str = "/events?is_app=0";

/// Logged-in scraper for the booking portal.
///
/// Every call to [`AppointmentSource::fetch_appointments`] starts a fresh login,
/// the session cookie lives in this scraper's own client.
pub struct PortalScraper {
    config: PortalConfig,
    client: Client,
}

impl PortalScraper {
    /// Create a scraper with its own cookie store
    pub fn new(config: PortalConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> SyncResult<Url> {
        Url::parse(&self.config.base_url)
            .and_then(|base| base.join(path))
            .map_err(|e| config_error(&format!("Invalid portal URL: {}", e)))
    }

    /// Log in with username, password and the form's CSRF token
    async fn login(&self) -> SyncResult<()> {
        let landing = self
            .client
            .get(self.url("/")?)
            .send()
            .await
            .map_err(|e| portal_error(&format!("Failed to load login page: {}", e)))?
            .text()
            .await
            .map_err(|e| portal_error(&format!("Failed to read login page: {}", e)))?;

        let csrf_token = parse_csrf_token(&landing)?.unwrap_or_else(|| {
            warn!("No CSRF token on the login page, trying without");
            String::new()
        });
        debug!("Retrieved CSRF token ({} chars)", csrf_token.len());

        let form = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("_token", csrf_token.as_str()),
        ];

        let response = self
            .client
            .post(self.url(LOGIN_PATH)?)
            .form(&form)
            .send()
            .await
            .map_err(|e| portal_error(&format!("Failed to send login: {}", e)))?;

        let status = response.status();
        info!("Login response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| portal_error(&format!("Failed to read login response: {}", e)))?;

        if !status.is_success() || !is_logged_in(&body) {
            return Err(auth_error(&format!(
                "portal answered HTTP {} without the appointments area",
                status
            )));
        }

        Ok(())
    }

    /// Fetch the raw events page of the logged-in session
    async fn fetch_events_page(&self) -> SyncResult<String> {
        let response = self
            .client
            .get(self.url(EVENTS_PATH)?)
            .send()
            .await
            .map_err(|e| portal_error(&format!("Failed to fetch appointments: {}", e)))?;

        if !response.status().is_success() {
            return Err(portal_error(&format!(
                "Failed to fetch appointments: HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| portal_error(&format!("Failed to read appointments page: {}", e)))
    }
}

#[async_trait]
impl AppointmentSource for PortalScraper {
    async fn fetch_appointments(&self) -> SyncResult<AppointmentBatch> {
        self.login().await?;

        let html = self.fetch_events_page().await?;
        let batch =
            AppointmentBatch::capped(parse_appointments(&html)?, self.config.max_appointments);

        if batch.truncated {
            info!(
                "Portal lists more than {} appointments, keeping the first ones",
                batch.appointments.len()
            );
        }
        for appointment in &batch.appointments {
            info!("Appointment: {}", appointment.summary_line());
        }

        Ok(batch)
    }
}
