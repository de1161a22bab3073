use crate::error::{ServerError, ServerResult};
use crate::metrics::record_question;
use crate::routes::{SourceView, sources};
use crate::state::ServerState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `/chat` and `/api/v1/ask`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

/// POST /chat
///
/// A missing body, unparsable JSON or a blank `query` all yield
/// `400 {"error": "No query provided", "code": "BAD_REQUEST"}`.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ServerResult<Json<ChatResponse>> {
    let query = query_from(payload)?;
    let answer = state.qa()?.ask(&query).await;
    record_question("chat", answer.is_ok());
    Ok(Json(ChatResponse {
        answer: answer?.answer,
    }))
}

/// POST /api/v1/ask: the answer plus the chunks it was built from.
pub async fn ask(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ServerResult<Json<AskResponse>> {
    let query = query_from(payload)?;
    let answer = state.qa()?.ask(&query).await;
    record_question("ask", answer.is_ok());
    let answer = answer?;
    Ok(Json(AskResponse {
        answer: answer.answer,
        sources: sources(answer.sources),
    }))
}

fn query_from(payload: Result<Json<ChatRequest>, JsonRejection>) -> ServerResult<String> {
    match payload {
        Ok(Json(ChatRequest { query: Some(query) })) if !query.trim().is_empty() => Ok(query),
        Ok(_) => Err(ServerError::no_query()),
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "chat_request_rejected");
            Err(ServerError::no_query())
        }
    }
}
