//! Calendar Module
//!
//! Lists upcoming events from Google Calendar.

mod client;
mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CalendarError;

pub use client::GoogleCalendarClient;
pub use types::CalendarEvent;

/// Source of calendar events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Lists single (expanded) events starting in `[time_min, time_max]`,
    /// ordered by start time.
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;
}
