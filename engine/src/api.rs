//! HTTP request surface
//!
//! # Endpoints
//!
//! - POST /api/health-check - Run one health check
//! - GET /api/memory/:owner/:name - Stored memory for a repository
//! - GET /api/status - Server status
//!
//! Failures answer `{"error": "..."}`: 400 for input errors, 404 for
//! unknown memory, 500 for everything else.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sdk::errors::{EngineError, PulseErrorExt};
use sdk::types::RepoId;
use sdk::Outcome;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::{HealthAgent, HealthCheckRequest, HealthReport};

/// State shared across handlers
#[derive(Clone)]
struct ApiState {
    agent: Arc<HealthAgent>,
    started_at: DateTime<Utc>,
}

/// Error answered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
    Engine(EngineError),
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        ApiError::Engine(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Unavailable(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            ApiError::Engine(e) if e.is_input_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Engine(e) => {
                tracing::error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Build the API router around `agent`
pub fn router(agent: Arc<HealthAgent>) -> Router {
    let state = ApiState {
        agent,
        started_at: Utc::now(),
    };

    Router::new()
        .route("/api/health-check", post(health_check_handler))
        .route("/api/memory/:owner/:name", get(memory_handler))
        .route("/api/status", get(status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check_handler(
    State(state): State<ApiState>,
    body: Result<Json<HealthCheckRequest>, JsonRejection>,
) -> Result<Json<HealthReport>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let report = state.agent.check(request).await?;
    Ok(Json(report))
}

async fn memory_handler(
    State(state): State<ApiState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let repo = RepoId::parse(&format!("{}/{}", owner, name))?;

    match state.agent.store().load(&repo).await {
        Outcome::Ok(Some(memory)) => Ok(Json(memory).into_response()),
        Outcome::Ok(None) => Err(ApiError::NotFound(format!(
            "No memory stored for {}",
            repo
        ))),
        Outcome::Degraded(reason) => Err(ApiError::Unavailable(reason)),
        Outcome::Fatal(e) => Err(ApiError::Engine(e)),
    }
}

async fn status_handler(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
    }))
}

/// Running API server
pub struct ApiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Bind `bind` and serve in the background
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Network` if the address cannot be bound.
    pub async fn start(bind: &str, agent: Arc<HealthAgent>) -> Result<Self, EngineError> {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .map_err(|e| EngineError::Network(format!("Failed to bind {}: {}", bind, e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| EngineError::Network(format!("Failed to get local address: {}", e)))?;

        let app = router(agent);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            tracing::info!("API server listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                    tracing::info!("API server shutting down gracefully");
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!("API server error: {}", e);
                });
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait for in-flight ones
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}
