//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `chat`: free-text questions (`/chat`, `/api/v1/ask`)
//! - `mcq`: structured multiple-choice quizzes (`/api/v1/mcq`)

pub mod chat;
pub mod health;
pub mod mcq;

use crate::error::{ServerError, ServerResult};
use axum::Json;
use axum::response::{Html, IntoResponse};
use index::SearchHit;
use serde::Serialize;
use serde_json::json;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Quiz page (GET /).
pub async fn page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// API version and endpoint listing (GET /api/v1).
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Quick MCQ",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/chat",
            "/api/v1/ask",
            "/api/v1/mcq",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// A retrieved chunk as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct SourceView {
    pub id: String,
    pub source: String,
    pub page: usize,
    pub score: f32,
    pub text: String,
}

impl From<SearchHit> for SourceView {
    fn from(hit: SearchHit) -> Self {
        Self {
            id: hit.chunk.id,
            source: hit.chunk.source,
            page: hit.chunk.page,
            score: hit.score,
            text: hit.chunk.text,
        }
    }
}

pub(crate) fn sources(hits: Vec<SearchHit>) -> Vec<SourceView> {
    hits.into_iter().map(SourceView::from).collect()
}
