//! Message formatting for notifications.

use chrono::{DateTime, FixedOffset, Utc};

use crate::calendar::CalendarEvent;
use crate::slack::{Attachment, AttachmentField};

const CLOCK_FORMAT: &str = "%H:%M";
const DIGEST_FORMAT: &str = "%Y %b %d %H:%M";

/// Text posted alongside an individual event reminder.
pub fn starts_in_text(minutes: i64) -> String {
    format!("This event starts in {} minutes", minutes)
}

/// Attachment describing a single upcoming event.
pub fn event_attachment(
    event: &CalendarEvent,
    start: DateTime<FixedOffset>,
    thumb_url: Option<&str>,
) -> Attachment {
    let mut fields = vec![AttachmentField {
        title: "Start Time".to_string(),
        value: start.format(CLOCK_FORMAT).to_string(),
        short: false,
    }];
    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        fields.push(AttachmentField {
            title: "Description".to_string(),
            value: description.to_string(),
            short: false,
        });
    }

    Attachment {
        fallback: event.summary.clone(),
        title: event.summary.clone(),
        title_link: event.html_link.clone(),
        thumb_url: thumb_url.map(str::to_string),
        fields,
    }
}

/// One digest line: `HH:MM-HH:MM: <link|summary>`.
pub fn digest_line(
    event: &CalendarEvent,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> String {
    format!(
        "{}-{}: <{}|{}>",
        start.format(CLOCK_FORMAT),
        end.format(CLOCK_FORMAT),
        event.html_link.as_deref().unwrap_or_default(),
        event.summary
    )
}

/// Title of the digest message for the window starting at `from`.
pub fn digest_title(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    format!(
        "Upcoming events between {} to {}",
        from.format(DIGEST_FORMAT),
        to.format(DIGEST_FORMAT)
    )
}

/// Whole minutes from `now` until `start`, rounded down.
pub fn minutes_until(start: DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    (start.with_timezone(&Utc) - now).num_minutes()
}
