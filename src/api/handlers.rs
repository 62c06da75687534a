//! API Handlers
//!
//! HTTP request handlers for each bot endpoint. The notify endpoints are
//! meant to be hit by an external scheduler (cron) as an alternative to the
//! built-in poll task.

use axum::{body::Bytes, extract::State, Json};

use crate::bot::Bot;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{HealthResponse, IndividualResponse, NotifyRequest, UpcomingResponse};

/// Default digest window in seconds (one day)
pub const DEFAULT_DIGEST_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The notifier
    pub bot: Bot,
    /// Default window for individual reminders, in seconds
    pub lookahead_secs: u64,
}

impl AppState {
    /// Creates a new AppState around the given bot.
    pub fn new(bot: Bot, lookahead_secs: u64) -> Self {
        Self {
            bot,
            lookahead_secs,
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(bot: Bot, config: &Config) -> Self {
        Self::new(bot, config.lookahead)
    }
}

/// Parses an optional JSON body. An empty body selects the defaults.
fn parse_request(body: &Bytes) -> Result<NotifyRequest, ApiError> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        NotifyRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed request body: {}", e)))?
    };
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }
    Ok(req)
}

/// Handler for POST /notify/individual
///
/// Posts reminders for events starting within the window.
pub async fn notify_individual_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IndividualResponse>, ApiError> {
    let req = parse_request(&body)?;
    let report = state
        .bot
        .notify_individual_events(chrono::Utc::now(), req.window(state.lookahead_secs))
        .await?;

    Ok(Json(report.into()))
}

/// Handler for POST /notify/upcoming
///
/// Posts one digest message listing events within the window.
pub async fn notify_upcoming_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpcomingResponse>, ApiError> {
    let req = parse_request(&body)?;
    let events = state
        .bot
        .notify_upcoming_events(chrono::Utc::now(), req.window(DEFAULT_DIGEST_WINDOW_SECS))
        .await?;

    Ok(Json(UpcomingResponse { events }))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
