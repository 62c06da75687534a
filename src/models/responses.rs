//! Response DTOs for the bot API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::bot::CycleReport;

/// Response body for POST /notify/individual
#[derive(Debug, Clone, Serialize)]
pub struct IndividualResponse {
    /// Reminders posted during this cycle
    pub posted: usize,
    /// Events skipped (recently notified, stale, or untimed)
    pub skipped: usize,
}

impl From<CycleReport> for IndividualResponse {
    fn from(report: CycleReport) -> Self {
        Self {
            posted: report.posted,
            skipped: report.skipped,
        }
    }
}

/// Response body for POST /notify/upcoming
#[derive(Debug, Clone, Serialize)]
pub struct UpcomingResponse {
    /// Number of events listed in the digest
    pub events: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Crate version
    pub version: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
