//! Configuration for document discovery and chunking.
//!
//! [`IngestConfig`] is cheap to clone and deserializes from the `ingest:`
//! section of the pipeline YAML file. Call [`IngestConfig::validate`] before
//! use; [`crate::RecursiveCharacterSplitter::from_config`] does so for you.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! assert_eq!(config.chunk_size, 1000);
//! assert_eq!(config.chunk_overlap, 100);
//! config.validate().expect("defaults are valid");
//! ```
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for the ingest stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned for source documents.
    ///
    /// Default: `./data`
    pub data_dir: PathBuf,

    /// Descend into sub-directories (the loader glob is `**/*.pdf`).
    ///
    /// Default: `true`
    pub recursive: bool,

    /// Target chunk length in characters.
    ///
    /// Default: `1000`
    pub chunk_size: usize,

    /// Characters carried over between consecutive chunks.
    ///
    /// Default: `100`
    pub chunk_overlap: usize,

    /// Trim whitespace from the edges of every emitted chunk.
    ///
    /// Default: `true`
    pub strip_whitespace: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            recursive: true,
            chunk_size: 1000,
            chunk_overlap: 100,
            strip_whitespace: true,
        }
    }
}

impl IngestConfig {
    /// Checks the chunking invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }
}

/// Configuration validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}
