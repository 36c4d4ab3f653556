use super::api::{EventList, GoogleEvent};
use super::models::{EventDraft, EventQuery, RemoteEvent};
use super::token::TokenManager;
use crate::components::CalendarBackend;
use crate::config::GoogleConfig;
use crate::error::{calendar_error, Error, SyncResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/";

/// Google Calendar v3 REST client for a single calendar
pub struct GoogleCalendarClient {
    calendar_id: String,
    token_manager: TokenManager,
    client: Client,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleConfig) -> SyncResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            calendar_id: config.calendar_id.clone(),
            token_manager: TokenManager::new(config),
            client,
        })
    }

    /// `.../calendars/{calendar_id}/events[/{event_id}]` with every segment escaped
    fn events_url(&self, event_id: Option<&str>) -> SyncResult<Url> {
        let mut url = Url::parse(API_BASE)
            .map_err(|e| calendar_error(&format!("Failed to parse URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| calendar_error("API base URL cannot have a path"))?;
            segments
                .pop_if_empty()
                .extend(["calendars", self.calendar_id.as_str(), "events"]);
            if let Some(event_id) = event_id {
                segments.push(event_id);
            }
        }
        Ok(url)
    }

    async fn bearer(&self) -> SyncResult<String> {
        let token = self.token_manager.get_access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    async fn fetch_page(&self, query: &EventQuery, page_token: Option<&str>) -> SyncResult<EventList> {
        let mut url = self.events_url(None)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(
                "timeMin",
                &query.time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            if let Some(time_max) = query.time_max {
                pairs.append_pair("timeMax", &time_max.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            if let Some((key, value)) = &query.private_filter {
                pairs.append_pair("privateExtendedProperty", &format!("{}={}", key, value));
            }
            pairs.append_pair("singleEvents", "true");
            pairs.append_pair("orderBy", "startTime");
            pairs.append_pair("maxResults", "250");
            if let Some(page_token) = page_token {
                pairs.append_pair("pageToken", page_token);
            }
        }

        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer().await?)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to fetch events: {}", e)))?;

        let response = check_status(response, "fetch events", None).await?;

        response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse events response: {}", e)))
    }
}

/// Map HTTP failures to errors, 404/410 on a single event become `NotFound`
async fn check_status(response: Response, action: &str, event_id: Option<&str>) -> SyncResult<Response> {
    let status = response.status();

    if let Some(event_id) = event_id {
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(Error::NotFound(event_id.to_string()));
        }
    }

    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(calendar_error(&format!(
            "Failed to {}: HTTP {} - {}",
            action, status, error_body
        )));
    }

    Ok(response)
}

async fn parse_event(response: Response, action: &str) -> SyncResult<RemoteEvent> {
    let event: GoogleEvent = response
        .json()
        .await
        .map_err(|e| calendar_error(&format!("Failed to parse {} response: {}", action, e)))?;

    event
        .into_remote()
        .ok_or_else(|| calendar_error(&format!("{} response has no event id", action)))
}

#[async_trait]
impl CalendarBackend for GoogleCalendarClient {
    async fn list_events(&self, query: &EventQuery) -> SyncResult<Vec<RemoteEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.fetch_page(query, page_token.as_deref()).await?;

            for item in page.items {
                match item.into_remote() {
                    Some(event) => events.push(event),
                    None => warn!("Skipping calendar event without id"),
                }
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Fetched {} events from Google Calendar", events.len());
        Ok(events)
    }

    async fn create_event(&self, draft: &EventDraft) -> SyncResult<RemoteEvent> {
        let response = self
            .client
            .post(self.events_url(None)?)
            .header("Authorization", self.bearer().await?)
            .json(&GoogleEvent::from(draft))
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to create event: {}", e)))?;

        let response = check_status(response, "create event", None).await?;
        parse_event(response, "create").await
    }

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> SyncResult<RemoteEvent> {
        let response = self
            .client
            .put(self.events_url(Some(event_id))?)
            .header("Authorization", self.bearer().await?)
            .json(&GoogleEvent::from(draft))
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to update event: {}", e)))?;

        let response = check_status(response, "update event", Some(event_id)).await?;
        parse_event(response, "update").await
    }

    async fn delete_event(&self, event_id: &str) -> SyncResult<()> {
        let response = self
            .client
            .delete(self.events_url(Some(event_id))?)
            .header("Authorization", self.bearer().await?)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to delete event: {}", e)))?;

        check_status(response, "delete event", Some(event_id)).await?;
        Ok(())
    }
}
