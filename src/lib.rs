//! Calendar Bot - posts Slack reminders for upcoming calendar events
//!
//! Polls a calendar, posts a reminder per event about to start, and uses an
//! expiring insert-once cache so each event is announced once per cooldown.

pub mod api;
pub mod auth;
pub mod bot;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod slack;
pub mod tasks;

pub use api::AppState;
pub use bot::{Bot, BotSettings, CycleReport};
pub use cache::{EventCache, MemoryCache};
pub use config::Config;
pub use error::{BotError, CacheError};
pub use tasks::spawn_poll_task;
