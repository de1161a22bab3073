use std::time::Duration;

use async_trait::async_trait;
use semantic::retry::execute_with_retry_async;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{GenerationConfig, Provider};
use crate::{GenerateError, GenerationRequest, Generator};

/// [`Generator`] backed by a hosted HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    cfg: GenerationConfig,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(cfg: GenerationConfig) -> Result<Self, GenerateError> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GenerateError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { cfg, client })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.cfg
    }

    fn payload(&self, request: &GenerationRequest) -> Value {
        match self.cfg.provider {
            Provider::HuggingFace => json!({
                "inputs": request.prompt,
                "parameters": {
                    "temperature": self.cfg.temperature,
                    "max_new_tokens": self.cfg.max_new_tokens,
                    "return_full_text": false
                }
            }),
            Provider::OpenAi => {
                let mut body = json!({
                    "model": self.cfg.model,
                    "messages": [{ "role": "user", "content": request.prompt }],
                    "temperature": self.cfg.temperature,
                    "max_tokens": self.cfg.max_new_tokens
                });
                if let Some(schema) = &request.response_schema {
                    body["response_format"] = json!({
                        "type": "json_schema",
                        "json_schema": {
                            "name": schema.name,
                            "schema": schema.schema,
                            "strict": true
                        }
                    });
                }
                body
            }
        }
    }

    async fn send(&self, payload: &Value) -> Result<Value, GenerateError> {
        let mut request = self.client.post(&self.cfg.endpoint).json(payload);
        if let Some(token) = self.cfg.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerateError::Upstream {
                status: status.as_u16(),
                message,
            });
        }
        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                GenerateError::Timeout(self.cfg.timeout_secs)
            } else {
                GenerateError::MalformedResponse(format!("invalid JSON body: {e}"))
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerateError {
        if e.is_timeout() {
            GenerateError::Timeout(self.cfg.timeout_secs)
        } else {
            GenerateError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    fn model(&self) -> &str {
        &self.cfg.model
    }

    fn supports_json_schema(&self) -> bool {
        self.cfg.provider.supports_json_schema()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerateError> {
        let payload = self.payload(request);
        let outcome = execute_with_retry_async(&self.cfg.retry, |_| self.send(&payload)).await;
        let attempts = outcome.attempts;
        let elapsed_ms = outcome.total_duration.as_millis() as u64;

        let body = match outcome.into_result() {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    provider = %self.cfg.provider,
                    attempts,
                    elapsed_ms,
                    error = %err,
                    "generation_failed"
                );
                return Err(err);
            }
        };
        let text = extract_text(self.cfg.provider, body)?;
        debug!(
            provider = %self.cfg.provider,
            attempts,
            elapsed_ms,
            chars = text.len(),
            "generation_completed"
        );
        Ok(text.trim().to_string())
    }
}

fn extract_text(provider: Provider, body: Value) -> Result<String, GenerateError> {
    let text = match provider {
        // `[{"generated_text": ..}]`, or a bare object from some deployments
        Provider::HuggingFace => match &body {
            Value::Array(items) => items.first().and_then(|i| i.get("generated_text")),
            Value::Object(_) => body.get("generated_text"),
            _ => None,
        },
        Provider::OpenAi => body.pointer("/choices/0/message/content"),
    };
    match text {
        Some(Value::String(s)) => Ok(s.clone()),
        // a refusal or tool call leaves content null
        Some(Value::Null) => Ok(String::new()),
        _ => Err(GenerateError::MalformedResponse(format!(
            "no generated text in {} response",
            provider
        ))),
    }
}
