//! Error types for the calendar bot
//!
//! Provides unified error handling using thiserror. The cache reports its
//! steady-state outcomes (miss, already exists) as variants so callers can
//! branch on them directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Error type for the de-duplication cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key not found, or found but expired at lookup time
    #[error("cache miss: {0}")]
    CacheMiss(String),

    /// Key already present at insert time
    #[error("entry exists: {0}")]
    EntryExists(String),

    /// Invalid key or TTL
    #[error("invalid cache request: {0}")]
    InvalidRequest(String),

    /// Lock or backend failure
    #[error("cache storage failure: {0}")]
    Storage(String),
}

impl CacheError {
    /// Returns true only for the cache-miss condition.
    ///
    /// Storage failures are never reported as misses, so a broken backend
    /// cannot cause a notification to be repeated.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, CacheError::CacheMiss(_))
    }

    /// Returns true when an insert found the key already present.
    pub fn is_entry_exists(&self) -> bool {
        matches!(self, CacheError::EntryExists(_))
    }
}

// == Auth Error Enum ==
/// Errors raised while loading OAuth2 configuration or tokens.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("client secrets file has neither an \"installed\" nor a \"web\" section")]
    MissingClientSection,

    #[error("token refresh rejected: {0}")]
    Refresh(String),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
}

// == Calendar Error Enum ==
/// Errors returned by the calendar service.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("authentication required")]
    AuthRequired,

    #[error("token expired")]
    TokenExpired,

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("calendar API error: {0}")]
    ApiError(String),

    #[error("failed to load OAuth2 credentials: {0}")]
    Auth(#[from] AuthError),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

// == Slack Error Enum ==
/// Errors returned by the chat service.
#[derive(Error, Debug)]
pub enum SlackError {
    #[error("slack API error: {0}")]
    Api(String),

    #[error("failed to find matching channel/group: {0}")]
    ChannelNotFound(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
}

// == Bot Error Enum ==
/// Errors from a notification cycle.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("failed to communicate with cache: {0}")]
    Cache(#[from] CacheError),

    #[error("failed to list events: {0}")]
    Calendar(#[from] CalendarError),

    #[error("failed to post message to slack: {0}")]
    Slack(#[from] SlackError),

    #[error("invalid event {id}: {reason}")]
    InvalidEvent { id: String, reason: String },

    #[error("invalid time window: {0}")]
    InvalidWindow(String),
}

// == API Error Enum ==
/// Error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Bot(#[from] BotError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) | ApiError::Bot(BotError::InvalidWindow(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Bot(BotError::Calendar(_)) | ApiError::Bot(BotError::Slack(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Bot(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
