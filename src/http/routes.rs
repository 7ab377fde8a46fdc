use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::status))
        // Device webhook
        .route("/webhook", post(handlers::webhook))
        .route("/webhook/setup-status", get(handlers::setup_status))
        // Per-user settings
        .route(
            "/api/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        // Session inspection
        .route("/sessions/:session_id", get(handlers::get_session))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
