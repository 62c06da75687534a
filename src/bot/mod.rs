//! Bot Module
//!
//! Notification workflows: per-event reminders de-duplicated through the
//! event cache, and a digest of everything scheduled in a window.

pub mod format;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::{Clock, EventCache, SystemClock, PROCESSED_MARKER};
use crate::calendar::{CalendarEvent, EventSource};
use crate::config::Config;
use crate::error::BotError;
use crate::slack::{Attachment, AttachmentField, ChatPoster, PostMessageParams};

// == Settings ==
/// Where and how the bot posts.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Calendar to read events from
    pub calendar_name: String,
    /// Channel name to post to
    pub slack_channel: String,
    /// Username shown on posts
    pub slack_username: Option<String>,
    /// Attachment thumbnail
    pub slack_thumb_url: Option<String>,
    /// How long a notified event is remembered
    pub cooldown: Duration,
}

impl BotSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            calendar_name: config.calendar_name.clone(),
            slack_channel: config.slack_channel.clone(),
            slack_username: config.slack_username.clone(),
            slack_thumb_url: config.slack_thumb_url.clone(),
            cooldown: config.notify_cooldown(),
        }
    }
}

/// Outcome of one individual-events cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Reminders posted
    pub posted: usize,
    /// Events already handled, stale, or without a start time
    pub skipped: usize,
}

// == Bot ==
/// Calendar-to-Slack notifier.
#[derive(Clone)]
pub struct Bot {
    cache: Arc<dyn EventCache>,
    calendar: Arc<dyn EventSource>,
    chat: Arc<dyn ChatPoster>,
    clock: Arc<dyn Clock>,
    settings: Arc<BotSettings>,
}

impl Bot {
    // == Constructor ==
    /// Creates a bot reading the system clock.
    pub fn new(
        cache: Arc<dyn EventCache>,
        calendar: Arc<dyn EventSource>,
        chat: Arc<dyn ChatPoster>,
        settings: BotSettings,
    ) -> Self {
        Self {
            cache,
            calendar,
            chat,
            clock: Arc::new(SystemClock),
            settings: Arc::new(settings),
        }
    }

    /// Replaces the clock used to decide whether an event is stale.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // == Individual Events ==
    /// Posts one reminder per event starting within `delta` of `t`.
    ///
    /// Events seen within the cooldown are skipped. Events that already
    /// started, or have no start time, are remembered without posting.
    pub async fn notify_individual_events(
        &self,
        t: DateTime<Utc>,
        delta: chrono::Duration,
    ) -> Result<CycleReport, BotError> {
        let end = window_end(t, delta)?;
        let events = self
            .calendar
            .list_events(&self.settings.calendar_name, t, end)
            .await?;

        let mut report = CycleReport::default();
        for event in events {
            match self.cache.get(&event.id) {
                Ok(_) => {
                    debug!("Event {} was processed recently, skipping", event.id);
                    report.skipped += 1;
                    continue;
                }
                Err(e) if e.is_cache_miss() => {}
                Err(e) => return Err(e.into()),
            }

            let now = self.clock.now();
            let start = match event.start {
                Some(start) if start.with_timezone(&Utc) >= now => start,
                _ => {
                    debug!("Event {} already started or has no start time, skipping", event.id);
                    self.remember(&event.id);
                    report.skipped += 1;
                    continue;
                }
            };

            let params = PostMessageParams {
                username: self.settings.slack_username.clone(),
                attachments: vec![format::event_attachment(
                    &event,
                    start,
                    self.settings.slack_thumb_url.as_deref(),
                )],
            };
            let text = format::starts_in_text(format::minutes_until(start, now));
            self.chat
                .post_message(&self.settings.slack_channel, &text, &params)
                .await?;

            info!("Posted reminder for event {} ({})", event.id, event.summary);
            self.remember(&event.id);
            report.posted += 1;
        }

        Ok(report)
    }

    // == Upcoming Events ==
    /// Posts a single digest of every event starting within `delta` of `t`.
    ///
    /// Nothing is posted for an empty window. Returns the number of events
    /// listed.
    pub async fn notify_upcoming_events(
        &self,
        t: DateTime<Utc>,
        delta: chrono::Duration,
    ) -> Result<usize, BotError> {
        let end = window_end(t, delta)?;
        let events = self
            .calendar
            .list_events(&self.settings.calendar_name, t, end)
            .await?;

        if events.is_empty() {
            debug!("No events between {} and {}", t, end);
            return Ok(0);
        }

        let fields = events
            .iter()
            .map(digest_field)
            .collect::<Result<Vec<_>, _>>()?;

        let title = format::digest_title(t, end);
        let params = PostMessageParams {
            username: self.settings.slack_username.clone(),
            attachments: vec![Attachment {
                fallback: title.clone(),
                title,
                title_link: None,
                thumb_url: self.settings.slack_thumb_url.clone(),
                fields,
            }],
        };
        self.chat
            .post_message(&self.settings.slack_channel, "", &params)
            .await?;

        info!("Posted digest of {} events", events.len());
        Ok(events.len())
    }

    /// Records an event as handled for the cooldown.
    fn remember(&self, event_id: &str) {
        match self
            .cache
            .add(event_id, PROCESSED_MARKER, self.settings.cooldown)
        {
            Ok(()) => {}
            Err(e) if e.is_entry_exists() => {
                debug!("Event {} already recorded", event_id);
            }
            Err(e) => warn!("Failed to record event {}: {}", event_id, e),
        }
    }
}

fn window_end(t: DateTime<Utc>, delta: chrono::Duration) -> Result<DateTime<Utc>, BotError> {
    if delta <= chrono::Duration::zero() {
        return Err(BotError::InvalidWindow("window must be positive".to_string()));
    }
    t.checked_add_signed(delta)
        .ok_or_else(|| BotError::InvalidWindow("window end out of range".to_string()))
}

fn digest_field(event: &CalendarEvent) -> Result<AttachmentField, BotError> {
    let invalid = |reason: &str| BotError::InvalidEvent {
        id: event.id.clone(),
        reason: reason.to_string(),
    };
    let start = event.start.ok_or_else(|| invalid("failed to parse start date/time"))?;
    let end = event.end.ok_or_else(|| invalid("failed to parse end date/time"))?;

    Ok(AttachmentField {
        title: String::new(),
        value: format::digest_line(event, start, end),
        short: false,
    })
}

#[cfg(test)]
mod tests;
