use crate::engine::Engine;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Buffering/gating engine (owns the session store)
    pub engine: Arc<Engine>,

    /// When the server started, for uptime reporting
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            started_at: Utc::now(),
        }
    }
}
