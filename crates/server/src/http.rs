//! HTTP Endpoints
//!
//! REST API for tutoring sessions. Each transcript record carries the
//! message id, role, content and, for assistant messages, the embeddable
//! audio (or the synthesis error text).

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use tutor_agent::{ConversationState, OnboardingStage, TranscriptEntry, TurnOutcome};

use crate::metrics::{metrics_handler, record_session_created};
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let timeout = Duration::from_secs(config.server.timeout_seconds);
    drop(config);

    Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Chat endpoint
        .route("/api/chat/:session_id", post(chat))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Admin endpoints
        .route("/admin/reload-config", post(reload_config))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_ORIGIN);
        return layer.allow_origin(HeaderValue::from_static(DEFAULT_ORIGIN));
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    layer.allow_origin(parsed_origins)
}

#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    stage: OnboardingStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proficiency: Option<String>,
    turn_count: usize,
    stage_turns: BTreeMap<&'static str, usize>,
    transcript: Vec<TranscriptEntry>,
}

impl SessionView {
    fn of(conversation: &ConversationState) -> Self {
        Self {
            session_id: conversation.id().to_string(),
            stage: conversation.stage(),
            name: conversation.user().name().map(str::to_string),
            proficiency: conversation.user().proficiency().map(str::to_string),
            turn_count: conversation.turn_count(),
            stage_turns: OnboardingStage::ALL
                .iter()
                .map(|stage| (stage.as_str(), conversation.turns_in(*stage)))
                .collect(),
            transcript: conversation.transcript(),
        }
    }
}

/// Create a session; the response includes the greeting and its audio
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ServerError> {
    state.sessions.ensure_capacity()?;

    let id = uuid::Uuid::new_v4().to_string();
    let conversation = state.orchestrator.open_session(id).await;
    let view = SessionView::of(&conversation);

    state.sessions.insert(conversation)?;
    record_session_created();

    Ok((StatusCode::CREATED, Json(view)))
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;

    let conversation = session.conversation().await;
    Ok(Json(SessionView::of(&conversation)))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// Chat request
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    #[serde(flatten)]
    outcome: TurnOutcome,
}

/// Run one turn for a session
///
/// The turn runs on its own task and keeps the session claimed until the
/// reply and its audio are stored, even if the request is dropped first.
async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    if request.message.trim().is_empty() {
        return Err(ServerError::InvalidRequest("message is empty".to_string()));
    }

    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ServerError::SessionNotFound(session_id.clone()))?;

    let mut conversation = session.begin_turn()?;
    session.touch();

    let orchestrator = state.orchestrator.clone();
    let message = request.message;
    let turn = tokio::spawn(async move {
        orchestrator.handle_turn(&mut conversation, &message).await
    });
    let outcome = turn
        .await
        .map_err(|e| ServerError::Internal(format!("turn task failed: {}", e)))??;
    session.touch();

    Ok(Json(ChatResponse {
        session_id,
        outcome,
    }))
}

/// Liveness plus session count
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let environment = format!("{:?}", state.get_config().environment);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": environment,
            "checks": {
                "sessions": {
                    "status": "ok",
                    "count": state.sessions.count()
                }
            }
        })),
    )
}

/// Readiness check with completion backend connectivity
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let llm = state.orchestrator.llm().clone();
    let probe_timeout = Duration::from_secs(state.get_config().server.readiness_timeout_seconds);
    let mut checks = serde_json::Map::new();

    checks.insert(
        "sessions".to_string(),
        serde_json::json!({
            "status": "ok",
            "count": state.sessions.count()
        }),
    );

    let llm_status = match tokio::time::timeout(probe_timeout, llm.is_available()).await {
        Ok(true) => "ok",
        Ok(false) => "unreachable",
        Err(_) => "timeout",
    };
    let ready = llm_status == "ok";

    checks.insert(
        "llm_backend".to_string(),
        serde_json::json!({
            "status": llm_status,
            "model": llm.model_name()
        }),
    );

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": checks
        })),
    )
}

/// Config reload endpoint
///
/// POST /admin/reload-config
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
        }
    }
}
