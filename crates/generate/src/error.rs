use semantic::retry::Retryable;
use thiserror::Error;

/// Failures talking to the generation endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    /// Connection refused, DNS failure, reset mid-body.
    #[error("generation request failed: {0}")]
    Transport(String),
    #[error("generation request timed out after {0}s")]
    Timeout(u64),
    /// Non-success HTTP status from the endpoint.
    #[error("generation endpoint returned {status}: {message}")]
    Upstream { status: u16, message: String },
    /// The body did not have the shape the provider promises.
    #[error("malformed generation response: {0}")]
    MalformedResponse(String),
}

impl GenerateError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerateError::Timeout(_))
    }
}

impl Retryable for GenerateError {
    fn is_transient(&self) -> bool {
        match self {
            GenerateError::Transport(_) | GenerateError::Timeout(_) => true,
            GenerateError::Upstream { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            GenerateError::InvalidConfig(_) | GenerateError::MalformedResponse(_) => false,
        }
    }
}
