use crate::error::{ServerError, ServerResult};
use crate::metrics::record_question;
use crate::routes::{SourceView, sources};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use generate::Mcq;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

fn default_count() -> usize {
    5
}

#[derive(Debug, Deserialize)]
pub struct McqRequest {
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct McqResponse {
    pub question: String,
    pub mcqs: Vec<Mcq>,
    /// Items dropped for lacking four options or an answer.
    pub skipped: usize,
    pub sources: Vec<SourceView>,
}

/// POST /api/v1/mcq
pub async fn generate_mcqs(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<McqRequest>, JsonRejection>,
) -> ServerResult<Json<McqResponse>> {
    let Json(request) =
        payload.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
    let quiz = state
        .qa()?
        .generate_mcqs(&request.topic, request.count)
        .await;
    record_question("mcq", quiz.is_ok());
    let quiz = quiz?;
    Ok(Json(McqResponse {
        question: quiz.question,
        mcqs: quiz.mcqs,
        skipped: quiz.skipped,
        sources: sources(quiz.sources),
    }))
}
