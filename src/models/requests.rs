//! Request DTOs for the bot API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Longest window a trigger may ask for, in seconds (31 days)
pub const MAX_WINDOW_SECS: u64 = 31 * 24 * 60 * 60;

/// Request body for the notify triggers (POST /notify/*)
///
/// # Fields
/// - `window_secs`: Optional look-ahead window in seconds (uses the
///   endpoint's default if not specified)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyRequest {
    /// Optional window in seconds
    #[serde(default)]
    pub window_secs: Option<u64>,
}

impl NotifyRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.window_secs {
            Some(0) => Some("window_secs must be positive".to_string()),
            Some(secs) if secs > MAX_WINDOW_SECS => Some(format!(
                "window_secs exceeds maximum of {} seconds",
                MAX_WINDOW_SECS
            )),
            _ => None,
        }
    }

    /// Window to use, falling back to `default_secs`.
    pub fn window(&self, default_secs: u64) -> chrono::Duration {
        let secs = self.window_secs.unwrap_or(default_secs).min(MAX_WINDOW_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}
