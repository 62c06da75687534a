//! Calendar API types and data structures.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Calendar event as used by the notifier.
///
/// `start` and `end` keep the offset the calendar reported so times can be
/// shown in the event's own zone. They are `None` for all-day events.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub html_link: Option<String>,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

impl CalendarEvent {
    pub(crate) fn from_api(api: ApiEvent) -> Self {
        Self {
            id: api.id,
            summary: api.summary.unwrap_or_default(),
            description: api.description.filter(|d| !d.is_empty()),
            html_link: api.html_link,
            start: api.start.and_then(|t| t.parse()),
            end: api.end.and_then(|t| t.parse()),
        }
    }
}

// == API Types ==

/// API response for an events list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
    pub html_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEventTime {
    pub date_time: Option<String>,
}

impl ApiEventTime {
    fn parse(self) -> Option<DateTime<FixedOffset>> {
        self.date_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}
