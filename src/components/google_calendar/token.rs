use crate::config::GoogleConfig;
use crate::error::{calendar_error, SyncResult};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this many seconds before the token actually expires
const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth token as kept in the token file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp
    pub expires_at: i64,
}

impl StoredToken {
    /// Whether the access token is still usable at `now`
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at - EXPIRY_SKEW_SECS > now
    }
}

/// Reply of the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Turn a fresh token response into a stored token, keeping the old refresh token if none came back
    pub fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now().timestamp() + self.expires_in.unwrap_or(3600),
        }
    }
}

#[derive(Clone)]
pub struct TokenManager {
    config: GoogleConfig,
    client: Client,
    cached: Arc<Mutex<Option<StoredToken>>>,
}

impl TokenManager {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Get a valid access token, refreshing and saving it when expired
    pub async fn get_access_token(&self) -> SyncResult<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(now)) {
            return Ok(token.access_token.clone());
        }

        let token = match cached.take() {
            Some(token) => token,
            None => load_token(&self.config.token_path).await?,
        };

        let token = if token.is_valid_at(now) {
            token
        } else {
            debug!("Access token expired, refreshing");
            let refreshed = self.refresh_token(&token).await?;
            save_token(&self.config.token_path, &refreshed).await?;
            refreshed
        };

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    /// Refresh an expired token
    async fn refresh_token(&self, token: &StoredToken) -> SyncResult<StoredToken> {
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| calendar_error("No refresh token in token file, run get_calendar_token"))?;

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to refresh token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(calendar_error(&format!(
                "Failed to refresh token: HTTP {} - {}",
                status, error_body
            )));
        }

        let new_token: TokenResponse = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse token response: {}", e)))?;

        info!("Refreshed Google access token");
        Ok(new_token.into_stored(Some(refresh_token)))
    }

    /// Store a token obtained from the authorization flow
    pub async fn set_token(&self, token: StoredToken) -> SyncResult<()> {
        save_token(&self.config.token_path, &token).await?;
        *self.cached.lock().await = Some(token);
        Ok(())
    }
}

/// Read the token file
pub async fn load_token(path: &Path) -> SyncResult<StoredToken> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        calendar_error(&format!(
            "Cannot read token file {}: {} (run get_calendar_token first)",
            path.display(),
            e
        ))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Write the token file
pub async fn save_token(path: &Path, token: &StoredToken) -> SyncResult<()> {
    let content = serde_json::to_string_pretty(token)?;
    tokio::fs::write(path, content).await?;
    Ok(())
}
