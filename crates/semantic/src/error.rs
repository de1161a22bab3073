use std::io;
use thiserror::Error;

use crate::retry::Retryable;

/// Errors surfaced while producing embeddings.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets or reach the embedding endpoint.
    #[error("download failed: {0}")]
    Download(String),
    /// The embedding endpoint answered with a non-success status.
    #[error("embedding endpoint returned {status}: {message}")]
    Upstream { status: u16, message: String },
    /// The embedding endpoint did not answer in time.
    #[error("embedding request timed out: {0}")]
    Timeout(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime, tokenizer, or response-shape errors.
    #[error("inference failure: {0}")]
    Inference(String),
}

impl Clone for SemanticError {
    fn clone(&self) -> Self {
        match self {
            SemanticError::ModelNotFound(s) => SemanticError::ModelNotFound(s.clone()),
            SemanticError::TokenizerMissing(s) => SemanticError::TokenizerMissing(s.clone()),
            SemanticError::InvalidConfig(s) => SemanticError::InvalidConfig(s.clone()),
            SemanticError::Download(s) => SemanticError::Download(s.clone()),
            SemanticError::Upstream { status, message } => SemanticError::Upstream {
                status: *status,
                message: message.clone(),
            },
            SemanticError::Timeout(s) => SemanticError::Timeout(s.clone()),
            SemanticError::Io(e) => SemanticError::Io(io::Error::new(e.kind(), e.to_string())),
            SemanticError::Inference(s) => SemanticError::Inference(s.clone()),
        }
    }
}

impl Retryable for SemanticError {
    fn is_transient(&self) -> bool {
        match self {
            SemanticError::Download(_) | SemanticError::Timeout(_) => true,
            SemanticError::Upstream { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}
