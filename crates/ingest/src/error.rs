//! Error types produced by the ingest crate.
//!
//! Every failure aborts the ingestion run: there is no partial result and no
//! resume. Errors are typed, cloneable and comparable so callers (and tests)
//! can match on the exact cause.
//!
//! | Error | Category | Description |
//! |-------|----------|-------------|
//! | [`Config`](IngestError::Config) | Validation | Chunking parameters rejected |
//! | [`DirectoryNotFound`](IngestError::DirectoryNotFound) | Filesystem | Data directory missing |
//! | [`Io`](IngestError::Io) | Filesystem | Walking or reading a file failed |
//! | [`Pdf`](IngestError::Pdf) | Parsing | A PDF could not be opened or read |
//! | [`NoDocuments`](IngestError::NoDocuments) | Validation | Directory holds no matching files |
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while loading and splitting source documents.
///
/// # Examples
///
/// ```rust
/// use ingest::IngestError;
///
/// let err = IngestError::NoDocuments("./data".to_string());
/// assert_eq!(err.to_string(), "no documents found under ./data");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// Chunking or loader configuration is invalid.
    #[error("invalid ingest config: {0}")]
    Config(#[from] ConfigError),

    /// The configured data directory does not exist or is not a directory.
    #[error("data directory not found: {0}")]
    DirectoryNotFound(String),

    /// Walking the directory tree or reading a file failed.
    #[error("io error at {path}: {message}")]
    Io { path: String, message: String },

    /// A PDF could not be parsed.
    #[error("failed to read pdf {path}: {message}")]
    Pdf { path: String, message: String },

    /// The directory contained no file with a supported extension.
    #[error("no documents found under {0}")]
    NoDocuments(String),
}

impl IngestError {
    pub(crate) fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn pdf(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Pdf {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
