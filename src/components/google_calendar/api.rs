//! Calendar v3 JSON payloads and their mapping to [`RemoteEvent`] / [`EventDraft`].

use super::models::{EventDraft, RemoteEvent};
use super::time::{format_event_time, parse_event_time};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub shared: HashMap<String, String>,
}

/// One page of `events.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl GoogleEvent {
    /// Convert to the backend-neutral event, None when the event has no id
    pub fn into_remote(self) -> Option<RemoteEvent> {
        let id = self.id.filter(|id| !id.is_empty())?;

        Some(RemoteEvent {
            id,
            summary: self.summary.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            start: parse_event_time(self.start.as_ref()),
            end: parse_event_time(self.end.as_ref()),
            private_metadata: self
                .extended_properties
                .map(|props| props.private)
                .unwrap_or_default(),
        })
    }
}

impl From<&EventDraft> for GoogleEvent {
    fn from(draft: &EventDraft) -> Self {
        let timed = |value: &DateTime<FixedOffset>| EventDateTime {
            date_time: Some(format_event_time(value)),
            date: None,
            time_zone: Some(draft.time_zone.clone()),
        };

        GoogleEvent {
            id: None,
            summary: Some(draft.summary.clone()),
            location: Some(draft.location.clone()),
            description: Some(draft.description.clone()),
            start: Some(timed(&draft.start)),
            end: Some(timed(&draft.end)),
            extended_properties: Some(ExtendedProperties {
                private: draft.private_metadata.clone(),
                shared: HashMap::new(),
            }),
        }
    }
}
