use super::state::AppState;
use crate::buffer::text::sanitize;
use crate::buffer::Segment;
use crate::error::SettingsError;
use crate::gate::{normalize_uid, SettingsPatch};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

/// Payload limits enforced before segments reach the engine
pub const MAX_SEGMENTS: usize = 200;
pub const MAX_SEGMENT_TEXT_CHARS: usize = 2000;
pub const MAX_SPEAKER_CHARS: usize = 50;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct IdentityQuery {
    pub uid: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    /// Device recording session (falls back to the uid)
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active_sessions: usize,
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn validate_segments(segments: &[Segment]) -> Result<(), String> {
    if segments.len() > MAX_SEGMENTS {
        return Err(format!("At most {} segments per request", MAX_SEGMENTS));
    }
    for segment in segments {
        if segment.text.chars().count() > MAX_SEGMENT_TEXT_CHARS {
            return Err(format!("Segment text exceeds {} characters", MAX_SEGMENT_TEXT_CHARS));
        }
        if let Some(speaker) = &segment.speaker {
            if speaker.chars().count() > MAX_SPEAKER_CHARS {
                return Err(format!("Speaker label exceeds {} characters", MAX_SPEAKER_CHARS));
            }
        }
    }
    Ok(())
}

/// uid required by the user-facing endpoints: absent and malformed are reported differently
fn required_uid(query: &IdentityQuery) -> Result<String, Response> {
    match query.uid.as_deref() {
        None => Err(error_response(
            StatusCode::BAD_REQUEST,
            "UID missing. Append ?uid=YOUR_ID to the URL.",
        )),
        Some(raw) => normalize_uid(raw)
            .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, SettingsError::InvalidUid.to_string())),
    }
}

/// First candidate that normalizes to a valid uid
fn resolve_uid<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates.into_iter().flatten().find_map(normalize_uid)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /webhook
/// Ingest transcript segments and run the eligibility gate.
///
/// 200 with the dispatcher payload when it acted, 202 `{}` otherwise.
pub async fn webhook(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
    Json(req): Json<WebhookRequest>,
) -> Response {
    if let Err(message) = validate_segments(&req.segments) {
        warn!("Rejected webhook payload: {}", message);
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let uid = resolve_uid([query.uid.as_deref(), req.uid.as_deref()]);

    let session_id = query
        .session_id
        .as_deref()
        .or(req.session_id.as_deref())
        .map(sanitize)
        .filter(|s| !s.is_empty())
        .or_else(|| uid.clone());

    let Some(session_id) = session_id else {
        warn!("No session_id provided");
        return error_response(StatusCode::BAD_REQUEST, "No session_id provided");
    };

    let (report, outcome) = state
        .engine
        .handle_webhook(&session_id, uid.as_deref(), &req.segments)
        .await;

    debug!(
        session = %session_id,
        accepted = report.accepted,
        dropped = report.dropped,
        committed = report.committed,
        ?outcome,
        "webhook processed"
    );

    match outcome.payload() {
        Some(payload) => {
            info!("Action payload sent for session {}", session_id);
            (StatusCode::OK, Json(payload.clone())).into_response()
        }
        None => (StatusCode::ACCEPTED, Json(json!({}))).into_response(),
    }
}

/// GET /webhook/setup-status
pub async fn setup_status() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "is_setup_completed": true })))
}

/// GET /status
/// Active session count and uptime in seconds
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = Utc::now().signed_duration_since(state.started_at);

    Json(StatusResponse {
        active_sessions: state.engine.active_sessions().await,
        uptime: uptime.num_milliseconds() as f64 / 1000.0,
    })
}

/// GET /sessions/:session_id?uid=
/// Current buffer contents for a session owned by `uid`.
///
/// A session owned by someone else answers 404, same as a missing one.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<IdentityQuery>,
) -> Response {
    let uid = match required_uid(&query) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.engine.snapshot(&session_id).await {
        Some(snapshot) if snapshot.uid.as_deref() == Some(uid.as_str()) => {
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        _ => error_response(StatusCode::NOT_FOUND, format!("Session {} not found", session_id)),
    }
}

/// GET /api/settings?uid=
pub async fn get_settings(State(state): State<AppState>, Query(query): Query<IdentityQuery>) -> Response {
    let uid = match required_uid(&query) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    let settings = state.engine.settings().get(&uid).await;
    (StatusCode::OK, Json(settings)).into_response()
}

/// POST /api/settings?uid=
/// Partial update of `min_sentences` / `cooldown_seconds`
pub async fn update_settings(
    State(state): State<AppState>,
    Query(query): Query<IdentityQuery>,
    Json(patch): Json<SettingsPatch>,
) -> Response {
    let uid = match required_uid(&query) {
        Ok(uid) => uid,
        Err(response) => return response,
    };

    match state.engine.settings().update(&uid, patch).await {
        Ok(settings) => {
            info!("Updated settings for {}", uid);
            (StatusCode::OK, Json(settings)).into_response()
        }
        Err(e) => {
            warn!("Rejected settings update for {}: {}", uid, e);
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
