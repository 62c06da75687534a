//! Event Polling Task
//!
//! Background task that periodically runs the individual-event notifier.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::bot::Bot;

/// Spawns a background task that posts reminders for upcoming events.
///
/// Every `poll_interval` the task looks `lookahead` ahead and lets the bot
/// notify about each event it has not handled within its cooldown. A failed
/// cycle is logged and the loop carries on. A zero interval ends the task
/// immediately.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let poll_handle = spawn_poll_task(bot.clone(), Duration::from_secs(60), Duration::from_secs(900));
/// // Later, during shutdown:
/// poll_handle.abort();
/// ```
pub fn spawn_poll_task(bot: Bot, poll_interval: Duration, lookahead: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting event poll task with interval of {} seconds",
            poll_interval.as_secs()
        );

        if poll_interval.is_zero() {
            error!("Poll interval must be positive");
            return;
        }

        let lookahead = match chrono::Duration::from_std(lookahead) {
            Ok(lookahead) => lookahead,
            Err(e) => {
                error!("Invalid lookahead window: {}", e);
                return;
            }
        };

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match bot
                .notify_individual_events(chrono::Utc::now(), lookahead)
                .await
            {
                Ok(report) if report.posted > 0 => {
                    info!(
                        "Poll cycle: posted {} reminders, skipped {}",
                        report.posted, report.skipped
                    );
                }
                Ok(report) => {
                    debug!("Poll cycle: nothing to post, skipped {}", report.skipped);
                }
                Err(e) => error!("Poll cycle failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset, Utc};

    use crate::bot::BotSettings;
    use crate::cache::MemoryCache;
    use crate::calendar::{CalendarEvent, EventSource};
    use crate::error::{CalendarError, SlackError};
    use crate::slack::{ChatPoster, PostMessageParams};

    /// Returns one event that always starts five minutes from the call.
    #[derive(Default)]
    struct SoonCalendar {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EventSource for SoonCalendar {
        async fn list_events(
            &self,
            _calendar_id: &str,
            time_min: DateTime<Utc>,
            _time_max: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, CalendarError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start: DateTime<FixedOffset> = (time_min + chrono::Duration::minutes(5)).into();
            Ok(vec![CalendarEvent {
                id: "soon".to_string(),
                summary: "Soon".to_string(),
                description: None,
                html_link: None,
                start: Some(start),
                end: None,
            }])
        }
    }

    struct FailingCalendar;

    #[async_trait]
    impl EventSource for FailingCalendar {
        async fn list_events(
            &self,
            _calendar_id: &str,
            _time_min: DateTime<Utc>,
            _time_max: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, CalendarError> {
            Err(CalendarError::ApiError("500: backend error".to_string()))
        }
    }

    #[derive(Default)]
    struct CountingChat {
        posts: Mutex<usize>,
    }

    #[async_trait]
    impl ChatPoster for CountingChat {
        async fn post_message(
            &self,
            _channel: &str,
            _text: &str,
            _params: &PostMessageParams,
        ) -> Result<(), SlackError> {
            *self.posts.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn bot(calendar: Arc<dyn EventSource>, chat: Arc<CountingChat>) -> Bot {
        Bot::new(
            Arc::new(MemoryCache::new()),
            calendar,
            chat,
            BotSettings {
                calendar_name: "primary".to_string(),
                slack_channel: "calendar".to_string(),
                slack_username: None,
                slack_thumb_url: None,
                cooldown: Duration::from_secs(900),
            },
        )
    }

    /// Moves paused time forward one interval at a time so every tick runs.
    async fn run_ticks(ticks: u32, every: Duration) {
        tokio::task::yield_now().await;
        for _ in 0..ticks {
            tokio::time::advance(every).await;
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_posts_once_per_cooldown() {
        let calendar = Arc::new(SoonCalendar::default());
        let chat = Arc::new(CountingChat::default());
        let handle = spawn_poll_task(
            bot(calendar.clone(), chat.clone()),
            Duration::from_secs(60),
            Duration::from_secs(900),
        );

        // Several ticks run, only the first posts
        run_ticks(5, Duration::from_secs(60)).await;
        handle.abort();

        assert!(calendar.calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(*chat.posts.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_survives_failed_cycles() {
        let chat = Arc::new(CountingChat::default());
        let handle = spawn_poll_task(
            bot(Arc::new(FailingCalendar), chat.clone()),
            Duration::from_secs(60),
            Duration::from_secs(900),
        );

        run_ticks(4, Duration::from_secs(60)).await;
        assert!(!handle.is_finished(), "Task should keep running after errors");

        handle.abort();
        assert_eq!(*chat.posts.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_can_be_aborted() {
        let chat = Arc::new(CountingChat::default());
        let handle = spawn_poll_task(
            bot(Arc::new(FailingCalendar), chat),
            Duration::from_secs(60),
            Duration::from_secs(900),
        );

        handle.abort();

        let err = handle.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_poll_task_zero_interval_exits() {
        let chat = Arc::new(CountingChat::default());
        let handle = spawn_poll_task(
            bot(Arc::new(SoonCalendar::default()), chat.clone()),
            Duration::ZERO,
            Duration::from_secs(900),
        );

        // Returns cleanly instead of panicking inside the task
        assert!(handle.await.is_ok());
        assert_eq!(*chat.posts.lock().unwrap(), 0);
    }
}
