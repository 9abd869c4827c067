use super::state::AppState;
use crate::session::SessionError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: &SessionError) -> Response {
    let status = match err {
        SessionError::BackendUnavailable(_) | SessionError::Camera(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SessionError::Cancelled => StatusCode::CONFLICT,
        SessionError::Closed => StatusCode::GONE,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// POST /session/start
pub async fn start_session(State(state): State<AppState>) -> Response {
    info!("Start requested for session {}", state.session.id());

    match state.session.start().await {
        Ok(()) => (StatusCode::OK, Json(state.session.status())).into_response(),
        Err(e) => {
            warn!("Failed to start session: {}", e);
            error_response(&e)
        }
    }
}

/// POST /session/stop
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop requested for session {}", state.session.id());
    (StatusCode::OK, Json(state.session.stop()))
}

/// POST /session/toggle
pub async fn toggle_session(State(state): State<AppState>) -> Response {
    match state.session.toggle().await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => {
            warn!("Failed to toggle session: {}", e);
            error_response(&e)
        }
    }
}

/// GET /session/status
pub async fn get_session_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.status()))
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
