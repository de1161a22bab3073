//! Workspace umbrella crate for Quick MCQ.
//!
//! This crate stitches the stage crates into the two pipelines the binaries run:
//!
//! - [`build_index`]: PDF directory -> chunks -> embeddings -> persisted [`VectorIndex`].
//! - [`RetrievalQa`]: question -> embedding -> top-k chunks -> prompt -> hosted LLM -> answer,
//!   plus [`RetrievalQa::generate_mcqs`] for structured quizzes.
//!
//! Configuration lives in [`RagConfig`]; an optional [`PipelineMetrics`] observer receives
//! retrieval and generation timings.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod qa;

pub use generate::{
    GenerateError, GenerationConfig, GenerationRequest, Generator, HttpGenerator, Mcq, McqSet,
    Provider, ResponseSchema,
};
pub use index::{IndexConfig, IndexError, IndexRecord, Manifest, SearchHit, VectorIndex};
pub use ingest::{DocumentChunk, DocumentLoader, IngestConfig, IngestError, PdfLoader};
pub use semantic::{Embedder, EmbeddingMode, SemanticConfig, SemanticEmbedder, SemanticError};

pub use crate::config::{ConfigLoadError, RagConfig};
pub use crate::logging::init_tracing;
pub use crate::pipeline::{IngestReport, build_index};
pub use crate::prompt::{PromptError, PromptTemplate, mcq_question};
pub use crate::qa::{Answer, MAX_MCQS, McqAnswer, NO_ANSWER, RetrievalQa};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors that can occur while building the index or answering a question.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigLoadError),
    #[error("ingest failure: {0}")]
    Ingest(#[from] IngestError),
    #[error("embedding failure: {0}")]
    Embedding(#[from] SemanticError),
    #[error("index failure: {0}")]
    Index(#[from] IndexError),
    #[error("generation failure: {0}")]
    Generation(#[from] GenerateError),
    /// Caller input the pipeline refuses to run on.
    #[error("{0}")]
    InvalidRequest(String),
}

impl PipelineError {
    /// True when the caller, not a dependency, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::InvalidRequest(_))
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_retrieval(&self, latency: Duration, hits: usize);
    fn record_generation(&self, latency: Duration, result: Result<(), &GenerateError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Times one stage and reports it to the installed recorder, if any.
pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_retrieval(self, hits: usize) {
        self.recorder.record_retrieval(self.start.elapsed(), hits);
    }

    pub(crate) fn record_generation(self, result: Result<(), &GenerateError>) {
        self.recorder
            .record_generation(self.start.elapsed(), result);
    }
}
