//! HTTP API for wearable devices and the settings page
//!
//! - POST /webhook - Ingest transcript segments (200 with payload, or 202)
//! - GET /webhook/setup-status - Device setup probe
//! - GET /status - Active sessions and uptime
//! - GET|POST /api/settings?uid= - Per-user gate settings
//! - GET /sessions/:id?uid= - Inspect a session buffer owned by uid
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{MAX_SEGMENTS, MAX_SEGMENT_TEXT_CHARS, MAX_SPEAKER_CHARS};
pub use routes::create_router;
pub use state::AppState;
