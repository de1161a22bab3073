use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use generate::GenerateError;
use index::IndexError;
use quickmcq::PipelineError;
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned for every malformed `/chat` request.
pub const NO_QUERY: &str = "No query provided";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    /// The index could not be loaded at start-up.
    #[error("Index not ready: {0}")]
    NotReady(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// Error body: `{"error": "<message>", "code": "<CODE>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ServerError {
    pub fn no_query() -> Self {
        ServerError::BadRequest(NO_QUERY.to_string())
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Pipeline(err) => match err {
                PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                PipelineError::Generation(GenerateError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
                PipelineError::Generation(GenerateError::InvalidConfig(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                PipelineError::Generation(_) => StatusCode::BAD_GATEWAY,
                PipelineError::Index(IndexError::NotFound(_)) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::NotFound => "NOT_FOUND",
            ServerError::NotReady(_) => "INDEX_NOT_READY",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Pipeline(_) => match self.status_code() {
                StatusCode::BAD_REQUEST => "BAD_REQUEST",
                StatusCode::GATEWAY_TIMEOUT => "UPSTREAM_TIMEOUT",
                StatusCode::BAD_GATEWAY => "UPSTREAM_ERROR",
                StatusCode::SERVICE_UNAVAILABLE => "INDEX_NOT_READY",
                _ => "INTERNAL_ERROR",
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request_failed");
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}
