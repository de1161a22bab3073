use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where embeddings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Local ONNX sentence-transformer.
    #[default]
    Onnx,
    /// Remote HTTP feature-extraction endpoint.
    Api,
    /// Deterministic hashed bag-of-words, no model required.
    Fast,
}

impl EmbeddingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingMode::Onnx => "onnx",
            EmbeddingMode::Api => "api",
            EmbeddingMode::Fast => "fast",
        }
    }
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(EmbeddingMode::Onnx),
            "api" => Ok(EmbeddingMode::Api),
            "fast" => Ok(EmbeddingMode::Fast),
            other => Err(format!("unknown embedding mode '{other}'")),
        }
    }
}

/// Request/response dialect spoken by the remote embedding endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    /// `{"inputs": [...]}` -> `[[f32]]`
    #[serde(alias = "hf")]
    HuggingFace,
    /// `{"input": [...], "model": ...}` -> `{"data": [{"embedding": [...]}]}`
    OpenAi,
    /// `{"texts": [...]}` -> `{"embeddings": [[f32]]}`
    #[default]
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("ONNX".parse::<EmbeddingMode>(), Ok(EmbeddingMode::Onnx));
        assert_eq!(" fast ".parse::<EmbeddingMode>(), Ok(EmbeddingMode::Fast));
        assert!("gpu".parse::<EmbeddingMode>().is_err());
    }

    #[test]
    fn provider_accepts_hf_alias() {
        let provider: ApiProvider = serde_json::from_str("\"hf\"").unwrap();
        assert_eq!(provider, ApiProvider::HuggingFace);
        let provider: ApiProvider = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(provider, ApiProvider::OpenAi);
    }
}
