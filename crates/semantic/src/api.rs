use serde_json::{json, Value};
use tracing::debug;

use crate::retry::execute_with_retry_async;
use crate::types::ApiProvider;
use crate::{SemanticConfig, SemanticError};

/// Embeds `texts` through the configured remote endpoint, retrying transient failures.
pub(crate) async fn embed_via_api(
    client: &reqwest::Client,
    cfg: &SemanticConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, SemanticError> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }
    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
    let payload = build_api_payload(cfg.api_provider, texts, &cfg.model_name);

    let outcome = execute_with_retry_async(&cfg.retry, |_| {
        send_api_request(client, url, cfg, &payload)
    })
    .await;
    debug!(
        attempts = outcome.attempts,
        elapsed_ms = outcome.total_duration.as_millis() as u64,
        inputs = texts.len(),
        "embedding_api_call"
    );

    let vectors = parse_embeddings_from_value(outcome.into_result()?)?;
    if vectors.len() != texts.len() {
        return Err(SemanticError::Inference(format!(
            "API returned {} embeddings for {} inputs",
            vectors.len(),
            texts.len()
        )));
    }
    Ok(vectors)
}

fn build_api_payload(provider: ApiProvider, texts: &[String], model: &str) -> Value {
    match provider {
        ApiProvider::HuggingFace => json!({ "inputs": texts }),
        ApiProvider::OpenAi => json!({ "input": texts, "model": model }),
        ApiProvider::Custom => json!({ "texts": texts }),
    }
}

async fn send_api_request(
    client: &reqwest::Client,
    url: &str,
    cfg: &SemanticConfig,
    payload: &Value,
) -> Result<Value, SemanticError> {
    let mut request = client.post(url).json(payload);
    if let Some(header) = cfg.api_auth_header.as_deref() {
        request = request.header(reqwest::header::AUTHORIZATION, header);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            SemanticError::Timeout(e.to_string())
        } else {
            SemanticError::Download(format!("HTTP request failed: {e}"))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SemanticError::Upstream {
            status: status.as_u16(),
            message: body,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SemanticError::Inference(format!("Invalid JSON response: {e}")))
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
