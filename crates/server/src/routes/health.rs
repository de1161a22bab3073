use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde_json::json;
use std::sync::Arc;

const SERVICE: &str = "quickmcq-server";

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime().as_secs(),
    }))
}

/// Readiness check endpoint
///
/// 200 with index details once the index is loaded, 503 otherwise.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    match state.qa() {
        Ok(qa) => {
            let manifest = qa.index().manifest();
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ready",
                    "service": SERVICE,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "index": {
                        "records": manifest.count,
                        "dimension": manifest.dimension,
                        "model_id": manifest.model_id,
                        "created_at": manifest.created_at.to_rfc3339(),
                    },
                    "k": qa.k(),
                })),
            )
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "service": SERVICE,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "reason": err.to_string(),
            })),
        ),
    }
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state.metrics().ok_or(ServerError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
