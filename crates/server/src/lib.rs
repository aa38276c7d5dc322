//! Cafe Tutor Server
//!
//! Provides the HTTP endpoints for tutoring sessions, plus health,
//! readiness, metrics and admin routes.

pub mod http;
pub mod metrics;
pub mod session;
pub mod startup;
pub mod state;

pub use http::create_router;
pub use crate::metrics::{init_metrics, record_session_created, record_sessions_expired};
pub use session::{Session, SessionLimits, SessionManager};
pub use startup::{build_orchestrator, check_credentials, probe_completion, StartupError};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tutor_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("A turn is already in progress for session {0}")]
    TurnInProgress(String),

    #[error("Max sessions reached")]
    SessionLimit,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::TurnInProgress(_) => StatusCode::CONFLICT,
            ServerError::SessionLimit => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EmptyMessage => ServerError::InvalidRequest(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        if matches!(self, ServerError::Internal(_)) {
            tracing::error!(error = %message, "Request failed");
        }
        let status: StatusCode = self.into();
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
