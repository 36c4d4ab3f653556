use crate::components::{Notifier, Priority};
use crate::config::PushoverConfig;
use crate::error::{notification_error, SyncResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

const MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";

/// Emergency messages must be acknowledged, Pushover requires retry and expire for them
const EMERGENCY_RETRY_SECS: &str = "60";
const EMERGENCY_EXPIRE_SECS: &str = "3600";

/// Sends notifications through the Pushover API
pub struct PushoverNotifier {
    config: PushoverConfig,
    client: Client,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> SyncResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, title: &str, body: &str, priority: Priority) -> SyncResult<()> {
        let priority_value = priority.value().to_string();
        let mut form = vec![
            ("token", self.config.app_token.as_str()),
            ("user", self.config.user_key.as_str()),
            ("title", title),
            ("message", body),
            ("priority", priority_value.as_str()),
        ];
        if priority == Priority::EMERGENCY {
            form.push(("retry", EMERGENCY_RETRY_SECS));
            form.push(("expire", EMERGENCY_EXPIRE_SECS));
        }

        let response = self
            .client
            .post(MESSAGES_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| notification_error(&format!("Failed to send notification: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(notification_error(&format!(
                "Pushover rejected notification: HTTP {} - {}",
                status, error_body
            )));
        }

        debug!("Sent notification: {}", title);
        Ok(())
    }
}

/// Used when no Pushover credentials are configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, title: &str, _body: &str, _priority: Priority) -> SyncResult<()> {
        debug!("Notifications disabled, not sending: {}", title);
        Ok(())
    }
}
