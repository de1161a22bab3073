//! Quick MCQ Generation
//!
//! Client side of the hosted LLM that writes answers. Two wire dialects are supported:
//!
//! - **Hugging Face text-generation** (default): the prompt goes out as `inputs` with
//!   `temperature` / `max_new_tokens` parameters, the answer comes back as `generated_text`.
//! - **OpenAI-compatible chat completions**: one user message; when a [`ResponseSchema`] is
//!   attached the endpoint is asked for strict JSON matching it.
//!
//! Calls carry a request timeout and are retried with exponential backoff on transient failures
//! (timeouts, 429, 5xx). The [`mcq`] module turns generated text into structured questions.
//!
//! ```no_run
//! use generate::{GenerationConfig, GenerationRequest, Generator, HttpGenerator};
//!
//! # async fn run() -> Result<(), generate::GenerateError> {
//! let generator = HttpGenerator::new(GenerationConfig::default().with_api_token("hf_xxx"))?;
//! let answer = generator
//!     .generate(&GenerationRequest::new("Question: What is 2 + 2?\nHelpful answer:"))
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcq;

mod client;

use async_trait::async_trait;
use serde_json::Value;

pub use crate::client::HttpGenerator;
pub use crate::config::{GenerationConfig, Provider};
pub use crate::error::GenerateError;
pub use crate::mcq::{mcq_schema, parse_mcqs, Mcq, McqSet};

/// Named JSON schema the model output must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Ignored by providers that cannot enforce a schema.
    pub response_schema: Option<ResponseSchema>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Anything that can complete a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model(&self) -> &str;

    /// Whether [`GenerationRequest::response_schema`] is enforced by the backend.
    fn supports_json_schema(&self) -> bool {
        false
    }

    /// Generated text, trimmed. Empty when the model produced nothing.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError>;
}
