//! # Quick MCQ Index
//!
//! A read-mostly vector index over document chunks. It is built once by the ingestion job,
//! persisted to a directory, and loaded read-only by the server.
//!
//! ## Core Features
//!
//! - **Exact cosine search**: vectors are stored as unit-length rows of an `ndarray` matrix, so a
//!   query is one matrix-vector product. Results are always `min(k, len)` hits, best first, with
//!   ties broken by insertion order.
//! - **Optional HNSW**: past [`AnnConfig::min_vectors_for_ann`] records an HNSW graph answers
//!   queries instead; if it comes back short the exact path is used.
//! - **Model-stamped persistence**: `manifest.json` records the embedding model id and dimension
//!   next to zstd-compressed bincode records, and loading refuses a mismatched embedder.
//! - **Atomic replace**: saves go to a sibling temp directory that is swapped into place.
//!
//! ## Example Usage
//!
//! ```
//! use index::{IndexConfig, IndexRecord, VectorIndex};
//! use ingest::{DocumentChunk, chunk_id};
//!
//! let chunk = |i: usize, text: &str| DocumentChunk {
//!     id: chunk_id("geo.pdf", 0, i),
//!     text: text.to_string(),
//!     source: "geo.pdf".into(),
//!     page: 0,
//!     chunk_index: i,
//!     start_index: Some(0),
//! };
//! let records = vec![
//!     IndexRecord::new(chunk(0, "north"), vec![1.0, 0.0]),
//!     IndexRecord::new(chunk(1, "east"), vec![0.0, 1.0]),
//! ];
//! let index = VectorIndex::build("toy-model", records, IndexConfig::default()).unwrap();
//!
//! let hits = index.search(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(hits[0].chunk.text, "north");
//! ```

pub mod ann;
mod store;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use bincode::error::{DecodeError, EncodeError};
use ingest::DocumentChunk;
use zstd::{decode_all, encode_all};

pub use crate::ann::{AnnConfig, AnnIndex, AnnResult};

/// Bump this value whenever the on-disk record or manifest layout changes.
pub const INDEX_SCHEMA_VERSION: u16 = 1;

/// A chunk together with its embedding.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IndexRecord {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

impl IndexRecord {
    pub fn new(chunk: DocumentChunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }
}

/// One retrieval result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk: DocumentChunk,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
    /// Insertion position of the record.
    pub position: usize,
}

/// Compression codec options for index storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    /// No compression (useful for debugging).
    None,
    /// Zstd compression (default, good balance of speed and ratio).
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Compression level (1-22 for Zstd, where higher = better compression but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| IndexError::Compression(e.to_string()))
            }
        }
    }

    fn decompress(codec: CompressionCodec, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                decode_all(data).map_err(|e| IndexError::Compression(e.to_string()))
            }
        }
    }
}

/// Config for building and loading the index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Compression settings for stored records.
    pub compression: CompressionConfig,
    /// HNSW settings for large indexes.
    pub ann: AnnConfig,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_ann(mut self, ann: AnnConfig) -> Self {
        self.ann = ann;
        self
    }
}

/// Metadata persisted beside the records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u16,
    pub model_id: String,
    pub dimension: usize,
    pub count: usize,
    pub created_at: DateTime<Utc>,
    pub compression: CompressionCodec,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("index not found at {0}")]
    NotFound(String),
    #[error("index io error: {0}")]
    Io(String),
    #[error("serialization encode error: {0}")]
    Encode(String),
    #[error("serialization decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("unsupported index schema version {found} (expected {expected})")]
    SchemaMismatch { expected: u16, found: u16 },
    #[error("index was built with embedding model '{found}' but '{expected}' is configured")]
    EmbeddingModelMismatch { expected: String, found: String },
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("cannot build an index without records")]
    Empty,
    #[error("corrupt index: {0}")]
    Corrupt(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

/// Immutable vector index.
pub struct VectorIndex {
    manifest: Manifest,
    records: Vec<IndexRecord>,
    /// Unit-length copies of every record vector, one row per record.
    matrix: Array2<f32>,
    ann: Option<AnnIndex>,
    cfg: IndexConfig,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("manifest", &self.manifest)
            .field("ann", &self.ann.is_some())
            .finish()
    }
}

impl VectorIndex {
    /// Builds an index from records sharing one dimension.
    pub fn build(
        model_id: impl Into<String>,
        records: Vec<IndexRecord>,
        cfg: IndexConfig,
    ) -> Result<Self, IndexError> {
        let manifest = Manifest {
            schema_version: INDEX_SCHEMA_VERSION,
            model_id: model_id.into(),
            dimension: records.first().map(|r| r.vector.len()).unwrap_or(0),
            count: records.len(),
            created_at: Utc::now(),
            compression: cfg.compression.codec,
        };
        Self::from_parts(manifest, records, cfg)
    }

    fn from_parts(
        manifest: Manifest,
        records: Vec<IndexRecord>,
        cfg: IndexConfig,
    ) -> Result<Self, IndexError> {
        if records.is_empty() {
            return Err(IndexError::Empty);
        }
        let dim = manifest.dimension;
        if dim == 0 {
            return Err(IndexError::Corrupt("zero-dimensional vectors".into()));
        }

        let mut flat = Vec::with_capacity(records.len() * dim);
        for record in &records {
            if record.vector.len() != dim {
                return Err(IndexError::DimensionMismatch {
                    expected: dim,
                    got: record.vector.len(),
                });
            }
            if record.vector.iter().any(|x| !x.is_finite()) {
                return Err(IndexError::Corrupt(format!(
                    "non-finite value in vector for {}",
                    record.chunk.id
                )));
            }
            flat.extend(unit(&record.vector));
        }
        let matrix = Array2::from_shape_vec((records.len(), dim), flat)
            .map_err(|e| IndexError::Corrupt(e.to_string()))?;

        let ann = if cfg.ann.should_use_ann(records.len()) {
            let rows: Vec<Vec<f32>> = matrix.rows().into_iter().map(|r| r.to_vec()).collect();
            AnnIndex::build(&rows, cfg.ann)
        } else {
            None
        };

        Ok(Self {
            manifest,
            records,
            matrix,
            ann,
            cfg,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn model_id(&self) -> &str {
        &self.manifest.model_id
    }

    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn config(&self) -> &IndexConfig {
        &self.cfg
    }

    /// Fails with [`IndexError::EmbeddingModelMismatch`] unless the index was built by `model_id`.
    pub fn ensure_model(&self, model_id: &str) -> Result<(), IndexError> {
        if self.manifest.model_id != model_id {
            return Err(IndexError::EmbeddingModelMismatch {
                expected: model_id.to_string(),
                found: self.manifest.model_id.clone(),
            });
        }
        Ok(())
    }

    /// The `min(k, len)` records most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension(),
                got: query.len(),
            });
        }
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }
        let q = Array1::from_vec(unit(query));

        if let Some(ann) = &self.ann {
            let hits = ann.search(q.as_slice().unwrap_or(&[]), k);
            if hits.len() == k {
                debug!(k, "ann_search");
                return Ok(hits
                    .into_iter()
                    .map(|hit| self.hit(hit.position, 1.0 - hit.distance))
                    .collect());
            }
        }

        let scores = self.matrix.dot(&q);
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        Ok(order
            .into_iter()
            .take(k)
            .map(|pos| self.hit(pos, scores[pos]))
            .collect())
    }

    fn hit(&self, position: usize, score: f32) -> SearchHit {
        SearchHit {
            chunk: self.records[position].chunk.clone(),
            score,
            position,
        }
    }
}

fn unit(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}
