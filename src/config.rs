//! YAML configuration for the Quick MCQ pipeline.
//!
//! One file describes every stage. All sections are optional; anything left out takes its
//! default, so an empty file (or no file at all) reproduces the stock setup: PDFs under `./data`,
//! the index under `./vectorstore/db_faiss`, MiniLM embeddings and a hosted Mistral model.
//!
//! [`RagConfig::load`] layers `QUICKMCQ_*` environment variables over the file, with `__`
//! between nested keys (`QUICKMCQ_RETRIEVAL__K=4`). Credentials never live in the file: the
//! generation token is read from `QUICKMCQ_GENERATION__API_TOKEN` or `HUGGINGFACEHUB_API_TOKEN`.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1"
//!
//! paths:
//!   data_dir: ./data
//!   index_path: ./vectorstore/db_faiss
//!
//! ingest:
//!   chunk_size: 1000
//!   chunk_overlap: 100
//!
//! semantic:
//!   mode: onnx
//!   model_name: sentence-transformers/all-MiniLM-L6-v2
//!
//! retrieval:
//!   k: 2
//!
//! generation:
//!   provider: huggingface
//!   endpoint: https://api-inference.huggingface.co/models/mistralai/Mistral-7B-Instruct-v0.2
//!   temperature: 0.5
//!   max_new_tokens: 512
//!
//! logging:
//!   level: info
//!   format: json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use generate::GenerationConfig;
use index::IndexConfig;
use ingest::IngestConfig;
use semantic::SemanticConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::PromptTemplate;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "QUICKMCQ";

/// Token variable read by the Hugging Face tooling.
pub const HUB_TOKEN_VAR: &str = "HUGGINGFACEHUB_API_TOKEN";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("failed to layer configuration: {0}")]
    Layered(#[from] config::ConfigError),
}

/// Top-level configuration for ingestion and serving.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Configuration format version
    pub version: String,
    pub paths: PathsConfig,
    /// Chunking settings. `data_dir` here is superseded by `paths.data_dir`.
    pub ingest: IngestConfig,
    pub semantic: SemanticConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            paths: PathsConfig::default(),
            ingest: IngestConfig::default(),
            semantic: SemanticConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for PDFs.
    pub data_dir: PathBuf,
    /// Directory the vector index is persisted to.
    pub index_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            index_path: PathBuf::from("./vectorstore/db_faiss"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks handed to the model per question.
    pub k: usize,
    /// Replaces the built-in prompt. Must contain `{context}` and `{question}`.
    pub prompt_template: Option<String>,
    pub index: IndexConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 2,
            prompt_template: None,
            index: IndexConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `quickmcq=debug,tower_http=info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl RagConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        // An empty document parses as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: RagConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Optional YAML file, then `QUICKMCQ_*` environment variables, then validation.
    ///
    /// Nested keys use `__`, e.g. `QUICKMCQ_PATHS__INDEX_PATH` or `QUICKMCQ_RETRIEVAL__K`.
    /// The generation token comes from `QUICKMCQ_GENERATION__API_TOKEN`, falling back to
    /// `HUGGINGFACEHUB_API_TOKEN`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigLoadError> {
        Self::layered(path, env_source(), std::env::var(HUB_TOKEN_VAR).ok())
    }

    fn layered(
        path: Option<&Path>,
        env: config::Environment,
        hub_token: Option<String>,
    ) -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).format(config::FileFormat::Yaml));
        }
        let layered = builder.add_source(env).build()?;

        // `api_token` is skipped by serde so it never round-trips through a file.
        let token = layered
            .get_string("generation.api_token")
            .ok()
            .or(hub_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut config: RagConfig = layered.try_deserialize()?;
        config.generation.api_token = token;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.ingest_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.semantic
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("semantic: {e}")))?;
        self.generation
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("generation: {e}")))?;

        if self.retrieval.k == 0 {
            return Err(ConfigLoadError::Validation(
                "retrieval.k must be >= 1".to_string(),
            ));
        }
        self.prompt()?;
        if self.paths.index_path.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "paths.index_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Ingest settings with `paths.data_dir` applied.
    pub fn ingest_config(&self) -> IngestConfig {
        self.ingest.clone().with_data_dir(self.paths.data_dir.clone())
    }

    /// The configured prompt, or the built-in MCQ prompt.
    pub fn prompt(&self) -> Result<PromptTemplate, ConfigLoadError> {
        match &self.retrieval.prompt_template {
            Some(template) => PromptTemplate::new(template.clone())
                .map_err(|e| ConfigLoadError::Validation(format!("retrieval.prompt_template: {e}"))),
            None => Ok(PromptTemplate::default()),
        }
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .ignore_empty(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use generate::Provider;
    use semantic::EmbeddingMode;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    #[test]
    fn defaults_match_the_stock_setup() {
        let cfg = RagConfig::default();
        assert_eq!(cfg.paths.data_dir, PathBuf::from("./data"));
        assert_eq!(cfg.paths.index_path, PathBuf::from("./vectorstore/db_faiss"));
        assert_eq!(cfg.retrieval.k, 2);
        assert_eq!(cfg.ingest.chunk_size, 1000);
        assert_eq!(cfg.ingest.chunk_overlap, 100);
        assert_eq!(cfg.generation.temperature, 0.5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1"
paths:
  data_dir: /srv/pdfs
ingest:
  chunk_size: 500
  chunk_overlap: 50
semantic:
  mode: fast
retrieval:
  k: 4
generation:
  provider: openai
  endpoint: http://localhost:8000/v1/chat/completions
  model: local-llm
"#;
        let cfg = RagConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.ingest_config().data_dir, PathBuf::from("/srv/pdfs"));
        assert_eq!(cfg.ingest.chunk_size, 500);
        assert_eq!(cfg.semantic.mode, EmbeddingMode::Fast);
        assert_eq!(cfg.retrieval.k, 4);
        assert_eq!(cfg.generation.provider, Provider::OpenAi);
        assert_eq!(cfg.generation.max_new_tokens, 512);
        assert_eq!(cfg.paths.index_path, PathBuf::from("./vectorstore/db_faiss"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickmcq.yaml");
        fs::write(&path, "retrieval:\n  k: 3\n").unwrap();

        let cfg = RagConfig::from_file(&path).unwrap();
        assert_eq!(cfg.retrieval.k, 3);
        assert!(matches!(
            RagConfig::from_file(dir.path().join("missing.yaml")),
            Err(ConfigLoadError::FileRead(_))
        ));
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(RagConfig::from_yaml("  \n").unwrap(), RagConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            RagConfig::from_yaml("version: \"2\""),
            Err(ConfigLoadError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            RagConfig::from_yaml("ingest:\n  chunk_size: 100\n  chunk_overlap: 100\n"),
            Err(ConfigLoadError::Validation(msg)) if msg.starts_with("ingest")
        ));
        assert!(matches!(
            RagConfig::from_yaml("retrieval:\n  k: 0\n"),
            Err(ConfigLoadError::Validation(_))
        ));
        assert!(matches!(
            RagConfig::from_yaml("retrieval:\n  prompt_template: \"no slots\"\n"),
            Err(ConfigLoadError::Validation(_))
        ));
        assert!(matches!(
            RagConfig::from_yaml("generation:\n  temperature: 9.0\n"),
            Err(ConfigLoadError::Validation(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = RagConfig::layered(
            None,
            env(&[
                ("QUICKMCQ_PATHS__INDEX_PATH", "/tmp/index"),
                ("QUICKMCQ_SEMANTIC__MODE", "fast"),
                ("QUICKMCQ_GENERATION__PROVIDER", "openai"),
                ("QUICKMCQ_RETRIEVAL__K", "5"),
            ]),
            Some("hf_abc".into()),
        )
        .unwrap();

        assert_eq!(cfg.paths.index_path, PathBuf::from("/tmp/index"));
        assert_eq!(cfg.semantic.mode, EmbeddingMode::Fast);
        assert_eq!(cfg.generation.provider, Provider::OpenAi);
        assert_eq!(cfg.retrieval.k, 5);
        assert_eq!(cfg.generation.api_token.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn env_layers_over_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickmcq.yaml");
        fs::write(&path, "paths:\n  data_dir: /srv/pdfs\nretrieval:\n  k: 3\n").unwrap();

        let cfg = RagConfig::layered(
            Some(path.as_path()),
            env(&[("QUICKMCQ_RETRIEVAL__K", "4"), ("QUICKMCQ_SERVER__PORT", "9000")]),
            None,
        )
        .unwrap();
        assert_eq!(cfg.retrieval.k, 4);
        assert_eq!(cfg.paths.data_dir, PathBuf::from("/srv/pdfs"));
        assert_eq!(cfg.generation.api_token, None);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let cfg = RagConfig::layered(None, env(&[("QUICKMCQ_RETRIEVAL__K", "")]), None).unwrap();
        assert_eq!(cfg.retrieval.k, 2);
    }

    #[test]
    fn prefixed_token_wins_over_hub_token() {
        let cfg = RagConfig::layered(
            None,
            env(&[("QUICKMCQ_GENERATION__API_TOKEN", " primary ")]),
            Some("fallback".into()),
        )
        .unwrap();
        assert_eq!(cfg.generation.api_token.as_deref(), Some("primary"));
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let err = RagConfig::layered(None, env(&[("QUICKMCQ_RETRIEVAL__K", "many")]), None)
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Layered(_)));

        let err = RagConfig::layered(None, env(&[("QUICKMCQ_RETRIEVAL__K", "0")]), None)
            .unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }

    #[test]
    fn yaml_never_carries_the_token() {
        let mut cfg = RagConfig::default();
        cfg.generation.api_token = Some("hf_secret".into());
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("hf_secret"));
    }
}
