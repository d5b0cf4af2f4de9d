//! Request handlers for the viewer API

use crate::server::error::{error_response, ApiError};
use crate::server::AppState;
use crate::session::record::truncate_chars;
use crate::session::SessionRecord;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Routes listed in the 404 response
pub const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "GET /api/health",
    "POST /api/viewers",
    "POST /api/viewers/leave",
    "GET /api/viewers/count",
];

/// Heartbeat body; unknown fields such as the client's `timestamp` are ignored
#[derive(Debug, Default, Deserialize)]
pub struct HeartbeatRequest {
    pub session_id: Option<String>,
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub live_viewers: usize,
    pub status: String,
    pub session_id: String,
    pub is_new_session: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaveRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveResponse {
    pub status: String,
    pub live_viewers: usize,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub live_viewers: usize,
    pub active_sessions: usize,
    pub timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub active_sessions: usize,
    /// Process uptime in seconds
    pub uptime: f64,
}

#[derive(Debug, Serialize)]
pub struct DebugSession {
    pub session_id: String,
    pub last_heartbeat: String,
    pub first_seen: String,
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
    pub is_expired: bool,
}

#[derive(Debug, Serialize)]
pub struct DebugConfig {
    pub session_timeout: u64,
    pub cleanup_interval: u64,
    pub max_sessions: usize,
    pub eviction_buffer: usize,
}

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub total_sessions: usize,
    pub sessions: Vec<DebugSession>,
    pub config: DebugConfig,
}

/// Shortened id for logs and the debug view
fn short_id(id: &str) -> String {
    format!("{}...", truncate_chars(id, 20))
}

/// A body sent without a JSON content type reads as empty, so the missing
/// `session_id` is reported instead of the media type
fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Register or refresh a viewer
pub async fn heartbeat(
    State(state): State<AppState>,
    payload: Result<Json<HeartbeatRequest>, JsonRejection>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let request = json_body(payload)?;
    let session_id = request.session_id.unwrap_or_default();

    let outcome = state.registry.touch(
        &session_id,
        request.page_url,
        request.user_agent.as_deref(),
    )?;

    if !state.config.general.production {
        debug!(
            "VIEWER_HEARTBEAT - Session: {} {} - Total: {}",
            short_id(&session_id),
            if outcome.is_new { "(NEW)" } else { "(UPDATE)" },
            outcome.live_viewers
        );
    }

    Ok(Json(HeartbeatResponse {
        live_viewers: outcome.live_viewers,
        status: "active".to_string(),
        session_id,
        is_new_session: outcome.is_new,
    }))
}

/// Drop a viewer that is leaving the page
pub async fn leave(
    State(state): State<AppState>,
    payload: Result<Json<LeaveRequest>, JsonRejection>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let request = json_body(payload)?;
    let session_id = request.session_id.unwrap_or_default();

    let outcome = state.registry.remove(&session_id)?;

    if !state.config.general.production {
        debug!(
            "VIEWER_LEAVE - Session: {} {} - Total: {}",
            short_id(&session_id),
            if outcome.removed { "(REMOVED)" } else { "(NOT_FOUND)" },
            outcome.live_viewers
        );
    }

    Ok(Json(LeaveResponse {
        status: if outcome.removed { "removed" } else { "not_found" }.to_string(),
        live_viewers: outcome.live_viewers,
        session_id,
    }))
}

/// Current number of live viewers
pub async fn count(State(state): State<AppState>) -> Json<CountResponse> {
    let live = state.registry.count();

    Json(CountResponse {
        live_viewers: live,
        active_sessions: live,
        timestamp: state.registry.now().timestamp_millis(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: state.registry.now().timestamp_millis(),
        active_sessions: state.registry.len(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// Full registry dump; only routed outside production
pub async fn debug_sessions(State(state): State<AppState>) -> Json<DebugResponse> {
    let records = state.registry.snapshot();
    let sessions: Vec<DebugSession> = records
        .iter()
        .map(|record| debug_view(&state, record))
        .collect();

    let limits = &state.config.sessions;
    Json(DebugResponse {
        total_sessions: sessions.len(),
        sessions,
        config: DebugConfig {
            session_timeout: limits.timeout_ms,
            cleanup_interval: limits.cleanup_interval_ms,
            max_sessions: limits.max_sessions,
            eviction_buffer: limits.eviction_buffer,
        },
    })
}

fn debug_view(state: &AppState, record: &SessionRecord) -> DebugSession {
    DebugSession {
        session_id: short_id(&record.id),
        last_heartbeat: record.last_heartbeat.to_rfc3339(),
        first_seen: record.first_seen.to_rfc3339(),
        page_url: record.page_url.clone(),
        user_agent: record
            .user_agent
            .as_deref()
            .map(|ua| format!("{}...", truncate_chars(ua, 50))),
        is_expired: state.registry.is_stale(record),
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "status": "error",
            "available_endpoints": AVAILABLE_ENDPOINTS,
        })),
    )
}

/// Known path, unsupported method
pub async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
