//! Configuration Module
//!
//! Handles loading and managing bot configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bot configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Calendar to poll for events
    pub calendar_name: String,
    /// Google OAuth2 client-secrets JSON file
    pub oauth2_config_file: PathBuf,
    /// Stored OAuth2 token JSON file
    pub oauth2_token_file: PathBuf,
    /// Slack bot token
    pub slack_token: String,
    /// Slack channel or group name to post to
    pub slack_channel: String,
    /// Username shown on posted messages
    pub slack_username: Option<String>,
    /// Thumbnail URL for message attachments
    pub slack_thumb_url: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Seconds between individual-event polls
    pub poll_interval: u64,
    /// Seconds ahead to look for upcoming events
    pub lookahead: u64,
    /// Seconds an event stays recorded as notified
    pub notify_cooldown: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CALENDAR_NAME` - Calendar id (default: primary)
    /// - `OAUTH2_CONFIG_FILE` - Client secrets file (default: config.json)
    /// - `OAUTH2_TOKEN_FILE` - Token file (default: token.json)
    /// - `SLACK_TOKEN` - Slack bot token (default: empty)
    /// - `SLACK_CHANNEL` - Channel name (default: empty)
    /// - `SLACK_USERNAME` - Bot username (default: unset)
    /// - `SLACK_THUMB_URL` - Attachment thumbnail (default: unset)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `POLL_INTERVAL` - Poll frequency in seconds (default: 60)
    /// - `LOOKAHEAD` - Look-ahead window in seconds (default: 900)
    /// - `NOTIFY_COOLDOWN` - Dedupe cooldown in seconds (default: 900)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            calendar_name: env::var("CALENDAR_NAME").unwrap_or(defaults.calendar_name),
            oauth2_config_file: env::var("OAUTH2_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.oauth2_config_file),
            oauth2_token_file: env::var("OAUTH2_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.oauth2_token_file),
            slack_token: env::var("SLACK_TOKEN").unwrap_or_default(),
            slack_channel: env::var("SLACK_CHANNEL").unwrap_or_default(),
            slack_username: non_empty_var("SLACK_USERNAME"),
            slack_thumb_url: non_empty_var("SLACK_THUMB_URL"),
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
            poll_interval: positive_var("POLL_INTERVAL").unwrap_or(defaults.poll_interval),
            lookahead: positive_var("LOOKAHEAD").unwrap_or(defaults.lookahead),
            notify_cooldown: positive_var("NOTIFY_COOLDOWN").unwrap_or(defaults.notify_cooldown),
        }
    }

    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Look-ahead window as a Duration.
    pub fn lookahead(&self) -> Duration {
        Duration::from_secs(self.lookahead)
    }

    /// Dedupe cooldown as a Duration.
    pub fn notify_cooldown(&self) -> Duration {
        Duration::from_secs(self.notify_cooldown)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar_name: "primary".to_string(),
            oauth2_config_file: PathBuf::from("config.json"),
            oauth2_token_file: PathBuf::from("token.json"),
            slack_token: String::new(),
            slack_channel: String::new(),
            slack_username: None,
            slack_thumb_url: None,
            server_port: 3000,
            poll_interval: 60,
            lookahead: 900,
            notify_cooldown: 900,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Durations of zero seconds fall back to the default.
fn positive_var(name: &str) -> Option<u64> {
    parsed_var::<u64>(name).filter(|v| *v > 0)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}
