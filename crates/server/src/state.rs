use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use index::{IndexError, VectorIndex};
use metrics_exporter_prometheus::PrometheusHandle;
use quickmcq::{Embedder, HttpGenerator, PipelineError, RagConfig, RetrievalQa, SemanticEmbedder};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state.
///
/// Built once at start-up; handlers only ever read it.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Answering pipeline, or why the index could not be loaded.
    qa: Result<Arc<RetrievalQa>, String>,

    /// Prometheus renderer, present when the recorder was installed.
    metrics: Option<PrometheusHandle>,

    started_at: Instant,
}

impl ServerState {
    pub fn new(config: ServerConfig, qa: Arc<RetrievalQa>) -> Self {
        Self {
            config: Arc::new(config),
            qa: Ok(qa),
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// State that serves health checks but refuses questions with 503.
    pub fn not_ready(config: ServerConfig, reason: impl Into<String>) -> Self {
        Self {
            config: Arc::new(config),
            qa: Err(reason.into()),
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// Builds the embedder, generator and index described by `rag`.
    ///
    /// A missing index is tolerated so `/health` stays up until ingestion has run.
    /// Every other failure, including an index built with another embedding model,
    /// aborts start-up.
    pub fn from_rag_config(config: ServerConfig, rag: &RagConfig) -> ServerResult<Self> {
        let embedder = Arc::new(
            SemanticEmbedder::new(rag.semantic.clone()).map_err(PipelineError::from)?,
        );
        let generator =
            Arc::new(HttpGenerator::new(rag.generation.clone()).map_err(PipelineError::from)?);

        let index = match VectorIndex::open(
            &rag.paths.index_path,
            embedder.model_id(),
            rag.retrieval.index.clone(),
        ) {
            Ok(index) => index,
            Err(IndexError::NotFound(path)) => {
                tracing::warn!(index_path = %path, "index_missing");
                return Ok(Self::not_ready(
                    config,
                    format!("no index at {path}; run the ingest binary first"),
                ));
            }
            Err(err) => return Err(PipelineError::from(err).into()),
        };
        tracing::info!(
            index_path = %rag.paths.index_path.display(),
            records = index.len(),
            model_id = %index.model_id(),
            "index_loaded"
        );

        let qa = RetrievalQa::from_config(rag, Arc::new(index), embedder, generator)?;
        Ok(Self::new(config, Arc::new(qa)))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// The pipeline, or [`ServerError::NotReady`].
    pub fn qa(&self) -> ServerResult<&RetrievalQa> {
        self.qa
            .as_deref()
            .map_err(|reason| ServerError::NotReady(reason.clone()))
    }

    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
