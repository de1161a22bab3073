//! Offline ingestion: PDFs in, persisted vector index out.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use index::{IndexRecord, VectorIndex};
use ingest::{DocumentLoader, ingest_directory};
use semantic::Embedder;
use serde::Serialize;
use tracing::{Instrument, Level, info, warn};

use crate::{PipelineError, RagConfig};

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub model_id: String,
    pub index_path: PathBuf,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Loads, splits and embeds every document under `paths.data_dir` and replaces the index at
/// `paths.index_path`.
///
/// Any failure aborts the run before the index directory is touched.
pub async fn build_index(
    cfg: &RagConfig,
    loader: &dyn DocumentLoader,
    embedder: &dyn Embedder,
) -> Result<IngestReport, PipelineError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "ingest.build_index",
        index_path = %cfg.paths.index_path.display()
    );

    match build_inner(cfg, loader, embedder).instrument(span).await {
        Ok(mut report) => {
            report.elapsed = start.elapsed();
            info!(
                files = report.files,
                pages = report.pages,
                chunks = report.chunks,
                dimension = report.dimension,
                model_id = %report.model_id,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "index_persisted"
            );
            Ok(report)
        }
        Err(err) => {
            warn!(
                error = %err,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "index_build_failure"
            );
            Err(err)
        }
    }
}

async fn build_inner(
    cfg: &RagConfig,
    loader: &dyn DocumentLoader,
    embedder: &dyn Embedder,
) -> Result<IngestReport, PipelineError> {
    let output = ingest_directory(&cfg.ingest_config(), loader)?;

    let texts: Vec<String> = output.chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_documents(&texts).await?;
    if vectors.len() != output.chunks.len() {
        return Err(PipelineError::Embedding(semantic::SemanticError::Inference(
            format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                output.chunks.len()
            ),
        )));
    }

    let chunks = output.chunks.len();
    let records = output
        .chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexRecord::new(chunk, vector))
        .collect();
    let index = VectorIndex::build(embedder.model_id(), records, cfg.retrieval.index.clone())?;
    index.save(&cfg.paths.index_path)?;

    Ok(IngestReport {
        files: output.files,
        pages: output.pages,
        chunks,
        dimension: index.dimension(),
        model_id: index.model_id().to_string(),
        index_path: cfg.paths.index_path.clone(),
        elapsed: Duration::ZERO,
    })
}
