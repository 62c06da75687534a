//! API Module
//!
//! HTTP handlers and routing for the bot's REST API.
//!
//! # Endpoints
//! - `POST /notify/individual` - Run one reminder cycle now
//! - `POST /notify/upcoming` - Post a digest of upcoming events
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
