//! Quick MCQ Semantic Embeddings
//!
//! This crate turns chunk text and questions into dense vectors for similarity search. The same
//! embedder must be used at ingestion and at query time; [`Embedder::model_id`] is what the index
//! records to enforce that.
//!
//! We support a few modes:
//!
//! - **ONNX mode** - Run a sentence-transformer locally (default: all-MiniLM-L6-v2). Model and
//!   tokenizer are downloaded on first use when URLs are configured.
//! - **API mode** - Call a remote feature-extraction endpoint (Hugging Face, OpenAI-compatible,
//!   or a custom `{"texts": [...]}` service) with retries on transient failures.
//! - **Fast mode** - Deterministic hashed bag-of-words. No model files, good for tests and demos.
//!
//! There is no silent fallback between modes: missing assets are an error, because vectors from
//! different models are not comparable.
//!
//! ## Threading notes
//!
//! Tokenizers and ONNX sessions get cached per-thread and inference runs on tokio's blocking
//! pool, so async callers never stall the runtime.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{Embedder, SemanticConfig, SemanticEmbedder};
//!
//! #[tokio::main]
//! async fn main() {
//!     let embedder = SemanticEmbedder::new(SemanticConfig::fast()).unwrap();
//!     let vector = embedder.embed_query("What is the capital of France?").await.unwrap();
//!     assert_eq!(vector.len(), 384);
//! }
//! ```

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

mod api;
mod assets;
mod cache;
mod fast;
mod normalize;
mod onnx;
mod serde_millis;

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

pub use crate::config::SemanticConfig;
pub use crate::error::SemanticError;
pub use crate::normalize::{cosine, l2_normalize_in_place};
pub use crate::types::{ApiProvider, EmbeddingMode};

use crate::api::embed_via_api;
use crate::assets::resolve_model_assets;
use crate::cache::get_or_load_model_handle;
use crate::fast::hashed_embedding;
use crate::onnx::run_onnx_embeddings;

/// Anything that can turn text into vectors for the retrieval pipeline.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier persisted with the index; vectors are only comparable within one id.
    fn model_id(&self) -> &str;

    /// One vector per input text, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| SemanticError::Inference("embedder returned no vector".into()))
    }
}

/// Config-driven [`Embedder`] covering the ONNX, API and fast modes.
#[derive(Debug, Clone)]
pub struct SemanticEmbedder {
    cfg: SemanticConfig,
    client: reqwest::Client,
    model_id: String,
}

impl SemanticEmbedder {
    pub fn new(cfg: SemanticConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.api_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| SemanticError::InvalidConfig(format!("http client: {e}")))?;
        let model_id = cfg.model_id();
        Ok(Self {
            cfg,
            client,
            model_id,
        })
    }

    pub fn config(&self) -> &SemanticConfig {
        &self.cfg
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        match self.cfg.mode {
            EmbeddingMode::Fast => Ok(texts
                .iter()
                .map(|t| hashed_embedding(t, self.cfg.fast_dimension))
                .collect()),
            EmbeddingMode::Api => embed_via_api(&self.client, &self.cfg, texts).await,
            EmbeddingMode::Onnx => {
                let assets = resolve_model_assets(&self.client, &self.cfg).await?;
                let owned = texts.to_vec();
                let max_len = self.cfg.max_sequence_length;
                tokio::task::spawn_blocking(move || {
                    let handle = get_or_load_model_handle(&assets)?;
                    run_onnx_embeddings(handle.as_ref(), &owned, max_len)
                })
                .await
                .map_err(|e| SemanticError::Inference(format!("inference task failed: {e}")))?
            }
        }
    }
}

#[async_trait]
impl Embedder for SemanticEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.cfg.batch_size) {
            let mut vectors = self.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(SemanticError::Inference(format!(
                    "backend returned {} embeddings for {} inputs",
                    vectors.len(),
                    batch.len()
                )));
            }
            if self.cfg.normalize {
                vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
            }
            out.extend(vectors);
        }
        debug!(
            mode = %self.cfg.mode,
            inputs = texts.len(),
            "embeddings_computed"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fast_embedder() -> SemanticEmbedder {
        SemanticEmbedder::new(SemanticConfig::fast()).unwrap()
    }

    #[tokio::test]
    async fn fast_mode_is_deterministic() {
        let embedder = fast_embedder();
        let a = embedder.embed_query("big cat").await.unwrap();
        let b = embedder.embed_query("big cat").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(embedder.model_id(), "fast-hash-384");
    }

    #[tokio::test]
    async fn vectors_are_unit_length_when_normalizing() {
        let v = fast_embedder().embed_query("some words here").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn normalization_can_be_disabled() {
        let embedder = SemanticEmbedder::new(SemanticConfig {
            normalize: false,
            ..SemanticConfig::fast()
        })
        .unwrap();
        let v = embedder.embed_query("word word").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 2.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn batches_preserve_order_across_chunks() {
        let embedder = SemanticEmbedder::new(SemanticConfig {
            batch_size: 2,
            ..SemanticConfig::fast()
        })
        .unwrap();
        let texts: Vec<String> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let batched = embedder.embed_documents(&texts).await.unwrap();
        assert_eq!(batched.len(), 5);
        for (text, vector) in texts.iter().zip(&batched) {
            assert_eq!(&embedder.embed_query(text).await.unwrap(), vector);
        }
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let out = fast_embedder().embed_documents(&[]).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn onnx_without_assets_is_an_error() {
        let embedder = SemanticEmbedder::new(SemanticConfig {
            model_path: PathBuf::from("./missing/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            tokenizer_url: None,
            ..SemanticConfig::default()
        })
        .unwrap();

        let err = embedder.embed_query("text").await.unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = SemanticEmbedder::new(SemanticConfig {
            mode: EmbeddingMode::Api,
            api_url: None,
            ..SemanticConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, SemanticError::InvalidConfig(_)));
    }

    #[tokio::test]
    #[ignore = "requires local ONNX + tokenizer assets under models/"]
    async fn real_model_inference() {
        let embedder = SemanticEmbedder::new(SemanticConfig::default()).unwrap();
        let v = embedder.embed_query("hello world").await.unwrap();
        assert_eq!(v.len(), 384);
    }
}
