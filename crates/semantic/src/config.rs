use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;
use crate::types::{ApiProvider, EmbeddingMode};
use crate::SemanticError;

const MINILM_BASE_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Runtime configuration describing which embedding backend to use and how to post-process
/// vectors.
///
/// # Example
/// ```no_run
/// use semantic::{EmbeddingMode, SemanticConfig, SemanticEmbedder};
///
/// let cfg = SemanticConfig {
///     mode: EmbeddingMode::Api,
///     api_url: Some("https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction".into()),
///     api_auth_header: Some("Bearer hf_xxx".into()),
///     api_provider: semantic::ApiProvider::HuggingFace,
///     ..Default::default()
/// };
///
/// let embedder = SemanticEmbedder::new(cfg).unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SemanticConfig {
    /// Inference mode selector: local ONNX, remote HTTP, or the hashed `fast` embedder.
    pub mode: EmbeddingMode,
    /// Model identifier recorded in the index manifest.
    pub model_name: String,
    /// Local path where the ONNX file should live (also used as the download target when
    /// [`model_url`](Self::model_url) is provided).
    pub model_path: PathBuf,
    /// Optional HTTPS URL that will be downloaded when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`.
    pub tokenizer_path: Option<PathBuf>,
    /// Optional HTTPS URL for fetching the tokenizer on-demand.
    pub tokenizer_url: Option<String>,
    /// Tokens beyond this length are truncated before inference.
    pub max_sequence_length: usize,
    /// API inference endpoint when [`mode`](Self::mode) is `api`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    #[serde(skip_serializing)]
    pub api_auth_header: Option<String>,
    pub api_provider: ApiProvider,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: u64,
    /// Texts sent to the backend per call.
    pub batch_size: usize,
    /// Output dimension of the `fast` embedder.
    pub fast_dimension: usize,
    /// Normalize the resulting vector to unit-length (recommended for cosine similarity).
    pub normalize: bool,
    /// Compute device (only `"cpu"` is implemented).
    pub device: String,
    /// Retry policy for API calls.
    pub retry: RetryConfig,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Onnx,
            model_name: "sentence-transformers/all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx"),
            model_url: Some(format!("{MINILM_BASE_URL}/onnx/model.onnx")),
            tokenizer_path: Some(PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json")),
            tokenizer_url: Some(format!("{MINILM_BASE_URL}/tokenizer.json")),
            max_sequence_length: 256,
            api_url: None,
            api_auth_header: None,
            api_provider: ApiProvider::Custom,
            api_timeout_secs: 30,
            batch_size: 32,
            fast_dimension: 384,
            normalize: true,
            device: "cpu".into(),
            retry: RetryConfig::default(),
        }
    }
}

impl SemanticConfig {
    /// Deterministic offline configuration, handy for tests and demos.
    pub fn fast() -> Self {
        Self {
            mode: EmbeddingMode::Fast,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.batch_size == 0 {
            return Err(SemanticError::InvalidConfig(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(SemanticError::InvalidConfig(
                "model_name must not be empty".into(),
            ));
        }
        match self.mode {
            EmbeddingMode::Api if self.api_url.is_none() => Err(SemanticError::InvalidConfig(
                "api_url is required for api mode".into(),
            )),
            EmbeddingMode::Fast if self.fast_dimension == 0 => Err(
                SemanticError::InvalidConfig("fast_dimension must be greater than zero".into()),
            ),
            EmbeddingMode::Onnx if self.device != "cpu" => Err(SemanticError::InvalidConfig(
                format!("unsupported device '{}'", self.device),
            )),
            _ => Ok(()),
        }
    }

    /// Identifier stamped into index manifests. Vectors from two configs are comparable only
    /// when their model ids match.
    pub fn model_id(&self) -> String {
        match self.mode {
            EmbeddingMode::Fast => format!("fast-hash-{}", self.fast_dimension),
            EmbeddingMode::Onnx | EmbeddingMode::Api => self.model_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let cfg = SemanticConfig::default();
        assert_eq!(cfg.mode, EmbeddingMode::Onnx);
        assert_eq!(cfg.model_name, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(
            cfg.model_path,
            PathBuf::from("./models/all-MiniLM-L6-v2/onnx/model.onnx")
        );
        assert!(cfg.model_url.as_deref().unwrap().ends_with("onnx/model.onnx"));
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.api_timeout_secs, 30);
        assert!(cfg.normalize);
        assert_eq!(cfg.device, "cpu");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn model_id_depends_on_mode() {
        assert_eq!(
            SemanticConfig::default().model_id(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
        assert_eq!(SemanticConfig::fast().model_id(), "fast-hash-384");
    }

    #[test]
    fn api_mode_requires_url() {
        let cfg = SemanticConfig {
            mode: EmbeddingMode::Api,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(SemanticError::InvalidConfig(msg)) if msg.contains("api_url")
        ));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let cfg = SemanticConfig {
            batch_size: 0,
            ..SemanticConfig::fast()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn auth_header_is_never_serialized() {
        let cfg = SemanticConfig {
            api_auth_header: Some("Bearer secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SemanticConfig =
            serde_json::from_str(r#"{"mode": "fast", "fast_dimension": 64}"#).unwrap();
        assert_eq!(cfg.mode, EmbeddingMode::Fast);
        assert_eq!(cfg.fast_dimension, 64);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.retry, RetryConfig::default());
    }
}
