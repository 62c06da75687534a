use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset};
use tokio_test::{assert_err, assert_ok};

use super::*;
use crate::cache::{CacheEntry, ManualClock, MemoryCache};
use crate::error::{CacheError, CalendarError, SlackError};

// == Fakes ==

struct FakeCalendar {
    events: Vec<CalendarEvent>,
    windows: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakeCalendar {
    fn new(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            windows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventSource for FakeCalendar {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        self.windows
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), time_min, time_max));
        Ok(self.events.clone())
    }
}

struct BrokenCalendar;

#[async_trait]
impl EventSource for BrokenCalendar {
    async fn list_events(
        &self,
        _calendar_id: &str,
        _time_min: DateTime<Utc>,
        _time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Err(CalendarError::TokenExpired)
    }
}

#[derive(Default)]
struct RecordingChat {
    posts: Mutex<Vec<(String, String, PostMessageParams)>>,
    fail: bool,
}

impl RecordingChat {
    fn failing() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn posts(&self) -> Vec<(String, String, PostMessageParams)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatPoster for RecordingChat {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        params: &PostMessageParams,
    ) -> Result<(), SlackError> {
        if self.fail {
            return Err(SlackError::Api("channel_not_found".to_string()));
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string(), params.clone()));
        Ok(())
    }
}

struct BrokenCache;

impl EventCache for BrokenCache {
    fn add(&self, _key: &str, _value: &[u8], _ttl: Duration) -> crate::error::Result<()> {
        Err(CacheError::Storage("backend unavailable".to_string()))
    }

    fn get(&self, _key: &str) -> crate::error::Result<CacheEntry> {
        Err(CacheError::Storage("backend unavailable".to_string()))
    }
}

// == Helpers ==

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-02-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn event(id: &str, start: Option<&str>, end: Option<&str>) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: format!("Event {}", id),
        description: Some("Agenda".to_string()),
        html_link: Some(format!("https://calendar.google.com/event?eid={}", id)),
        start: start.map(at),
        end: end.map(at),
    }
}

fn settings() -> BotSettings {
    BotSettings {
        calendar_name: "primary".to_string(),
        slack_channel: "calendar".to_string(),
        slack_username: Some("calbot".to_string()),
        slack_thumb_url: None,
        cooldown: Duration::from_secs(900),
    }
}

struct Harness {
    clock: Arc<ManualClock>,
    cache: Arc<MemoryCache>,
    calendar: Arc<FakeCalendar>,
    chat: Arc<RecordingChat>,
    bot: Bot,
}

fn harness(events: Vec<CalendarEvent>) -> Harness {
    let clock = Arc::new(ManualClock::new(now()));
    let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
    let calendar = Arc::new(FakeCalendar::new(events));
    let chat = Arc::new(RecordingChat::default());
    let bot = Bot::new(cache.clone(), calendar.clone(), chat.clone(), settings())
        .with_clock(clock.clone());
    Harness {
        clock,
        cache,
        calendar,
        chat,
        bot,
    }
}

// == Individual Events ==

#[tokio::test]
async fn test_individual_posts_and_records() {
    let h = harness(vec![event(
        "evt1",
        Some("2024-02-01T00:10:30Z"),
        Some("2024-02-01T00:30:00Z"),
    )]);

    let report = assert_ok!(
        h.bot
            .notify_individual_events(now(), ChronoDuration::minutes(15))
            .await
    );
    assert_eq!(report, CycleReport { posted: 1, skipped: 0 });

    let posts = h.chat.posts();
    assert_eq!(posts.len(), 1);
    let (channel, text, params) = &posts[0];
    assert_eq!(channel, "calendar");
    assert_eq!(text, "This event starts in 10 minutes");
    assert_eq!(params.username.as_deref(), Some("calbot"));
    assert_eq!(params.attachments[0].title, "Event evt1");
    assert_eq!(params.attachments[0].fields[0].value, "00:10");

    let entry = assert_ok!(h.cache.get("evt1"));
    assert_eq!(entry.value, PROCESSED_MARKER.to_vec());

    let windows = h.calendar.windows.lock().unwrap().clone();
    assert_eq!(
        windows,
        vec![("primary".to_string(), now(), now() + ChronoDuration::minutes(15))]
    );
}

#[tokio::test]
async fn test_individual_skips_within_cooldown() {
    let h = harness(vec![event(
        "evt1",
        Some("2024-02-01T00:10:00Z"),
        Some("2024-02-01T00:30:00Z"),
    )]);
    let window = ChronoDuration::minutes(15);

    assert_ok!(h.bot.notify_individual_events(now(), window).await);
    h.clock.advance(ChronoDuration::minutes(1));
    let report = assert_ok!(h.bot.notify_individual_events(h.clock.now(), window).await);

    assert_eq!(report, CycleReport { posted: 0, skipped: 1 });
    assert_eq!(h.chat.posts().len(), 1);
}

#[tokio::test]
async fn test_individual_reposts_after_cooldown() {
    let h = harness(vec![event(
        "evt1",
        Some("2024-02-01T00:20:00Z"),
        Some("2024-02-01T00:30:00Z"),
    )]);
    let window = ChronoDuration::minutes(30);

    assert_ok!(h.bot.notify_individual_events(now(), window).await);
    h.clock.advance(ChronoDuration::seconds(901));
    let report = assert_ok!(h.bot.notify_individual_events(h.clock.now(), window).await);

    assert_eq!(report.posted, 1);
    assert_eq!(h.chat.posts().len(), 2);
    assert_eq!(h.chat.posts()[1].1, "This event starts in 4 minutes");
}

#[tokio::test]
async fn test_individual_records_stale_and_untimed_without_posting() {
    let h = harness(vec![
        event("started", Some("2024-01-31T23:50:00Z"), Some("2024-02-01T00:10:00Z")),
        event("allday", None, None),
    ]);

    let report = assert_ok!(
        h.bot
            .notify_individual_events(now(), ChronoDuration::minutes(15))
            .await
    );

    assert_eq!(report, CycleReport { posted: 0, skipped: 2 });
    assert!(h.chat.posts().is_empty());
    assert_ok!(h.cache.get("started"));
    assert_ok!(h.cache.get("allday"));
}

#[tokio::test]
async fn test_individual_cache_failure_aborts_cycle() {
    let calendar = Arc::new(FakeCalendar::new(vec![event(
        "evt1",
        Some("2024-02-01T00:10:00Z"),
        None,
    )]));
    let chat = Arc::new(RecordingChat::default());
    let bot = Bot::new(Arc::new(BrokenCache), calendar, chat.clone(), settings());

    let err = assert_err!(
        bot.notify_individual_events(now(), ChronoDuration::minutes(15))
            .await
    );
    assert!(matches!(err, BotError::Cache(CacheError::Storage(_))));
    assert!(chat.posts().is_empty());
}

#[tokio::test]
async fn test_individual_post_failure_leaves_event_unrecorded() {
    let clock = Arc::new(ManualClock::new(now()));
    let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
    let calendar = Arc::new(FakeCalendar::new(vec![event(
        "evt1",
        Some("2024-02-01T00:10:00Z"),
        None,
    )]));
    let bot = Bot::new(
        cache.clone(),
        calendar,
        Arc::new(RecordingChat::failing()),
        settings(),
    )
    .with_clock(clock);

    let err = assert_err!(
        bot.notify_individual_events(now(), ChronoDuration::minutes(15))
            .await
    );
    assert!(matches!(err, BotError::Slack(_)));
    assert!(cache.get("evt1").unwrap_err().is_cache_miss());
}

#[tokio::test]
async fn test_individual_calendar_failure() {
    let bot = Bot::new(
        Arc::new(MemoryCache::new()),
        Arc::new(BrokenCalendar),
        Arc::new(RecordingChat::default()),
        settings(),
    );

    let err = assert_err!(
        bot.notify_individual_events(now(), ChronoDuration::minutes(15))
            .await
    );
    assert!(matches!(err, BotError::Calendar(CalendarError::TokenExpired)));
}

#[tokio::test]
async fn test_rejects_empty_window() {
    let h = harness(vec![]);

    let err = assert_err!(h.bot.notify_individual_events(now(), ChronoDuration::zero()).await);
    assert!(matches!(err, BotError::InvalidWindow(_)));
}

// == Upcoming Events ==

#[tokio::test]
async fn test_upcoming_posts_digest() {
    let h = harness(vec![
        event("a", Some("2024-02-01T09:00:00+09:00"), Some("2024-02-01T09:30:00+09:00")),
        event("b", Some("2024-02-01T13:00:00+09:00"), Some("2024-02-01T14:00:00+09:00")),
    ]);

    let count = assert_ok!(
        h.bot
            .notify_upcoming_events(now(), ChronoDuration::hours(24))
            .await
    );
    assert_eq!(count, 2);

    let posts = h.chat.posts();
    assert_eq!(posts.len(), 1);
    let (_, text, params) = &posts[0];
    assert_eq!(text, "");

    let attachment = &params.attachments[0];
    assert_eq!(
        attachment.title,
        "Upcoming events between 2024 Feb 01 00:00 to 2024 Feb 02 00:00"
    );
    assert_eq!(attachment.fallback, attachment.title);
    assert_eq!(
        attachment.fields[0].value,
        "09:00-09:30: <https://calendar.google.com/event?eid=a|Event a>"
    );
    assert_eq!(
        attachment.fields[1].value,
        "13:00-14:00: <https://calendar.google.com/event?eid=b|Event b>"
    );
}

#[tokio::test]
async fn test_upcoming_empty_window_posts_nothing() {
    let h = harness(vec![]);

    let count = assert_ok!(
        h.bot
            .notify_upcoming_events(now(), ChronoDuration::hours(24))
            .await
    );
    assert_eq!(count, 0);
    assert!(h.chat.posts().is_empty());
}

#[tokio::test]
async fn test_upcoming_rejects_untimed_event() {
    let h = harness(vec![event("allday", None, None)]);

    let err = assert_err!(
        h.bot
            .notify_upcoming_events(now(), ChronoDuration::hours(24))
            .await
    );
    assert!(matches!(err, BotError::InvalidEvent { id, .. } if id == "allday"));
    assert!(h.chat.posts().is_empty());
}

#[tokio::test]
async fn test_upcoming_does_not_touch_cache() {
    let h = harness(vec![event(
        "a",
        Some("2024-02-01T09:00:00Z"),
        Some("2024-02-01T09:30:00Z"),
    )]);

    assert_ok!(
        h.bot
            .notify_upcoming_events(now(), ChronoDuration::hours(24))
            .await
    );
    assert!(h.cache.is_empty().unwrap());
}
