//! Quick MCQ Ingest Layer
//!
//! This is where documents enter the retrieval pipeline. We walk a data
//! directory, pull the text out of every PDF page, and cut it into
//! overlapping chunks sized for embedding.
//!
//! ## What we do here
//!
//! - **Discover files** - Recursive, case-insensitive `*.pdf` match, sorted so
//!   two runs over the same directory see the same order.
//! - **Extract pages** - One [`SourceDocument`] per page with text, tagged with
//!   its source path and 0-based page number.
//! - **Split** - [`RecursiveCharacterSplitter`] with a 1000 character window
//!   and 100 characters of overlap by default.
//! - **Log everything** - Structured logs via tracing.
//!
//! ## Main entry point
//!
//! Call [`ingest_directory`] with an [`IngestConfig`] and a loader, get back an
//! [`IngestOutput`] holding the chunks. Any unreadable file aborts the run.
//!
//! ## Example
//!
//! ```
//! use ingest::{RecursiveCharacterSplitter, SourceDocument};
//!
//! let splitter = RecursiveCharacterSplitter::new(1000, 100).unwrap();
//! let page = SourceDocument::new("Paris is the capital of France.", "data/geo.pdf", 0);
//! let chunks = splitter.split_document(&page);
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].id, "data/geo.pdf#p0#c0");
//! ```
use std::time::Instant;

use tracing::{info, warn, Level};

mod config;
mod error;
mod loader;
mod splitter;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::loader::{discover_files, load_directory, DocumentLoader, LoadStats, PdfLoader};
pub use crate::splitter::RecursiveCharacterSplitter;
pub use crate::types::{chunk_id, DocumentChunk, SourceDocument};

/// Chunks produced by one ingest run plus counts for reporting.
#[derive(Debug, Clone)]
pub struct IngestOutput {
    pub chunks: Vec<DocumentChunk>,
    pub files: usize,
    pub pages: usize,
}

/// Loads every document under `cfg.data_dir` and splits it into chunks.
pub fn ingest_directory(
    cfg: &IngestConfig,
    loader: &dyn DocumentLoader,
) -> Result<IngestOutput, IngestError> {
    let start = Instant::now();
    let span = tracing::span!(
        Level::INFO,
        "ingest.directory",
        data_dir = %cfg.data_dir.display()
    );
    let _guard = span.enter();

    match ingest_inner(cfg, loader) {
        Ok(output) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                files = output.files,
                pages = output.pages,
                chunks = output.chunks.len(),
                elapsed_micros,
                "ingest_success"
            );
            Ok(output)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "ingest_failure");
            Err(err)
        }
    }
}

fn ingest_inner(
    cfg: &IngestConfig,
    loader: &dyn DocumentLoader,
) -> Result<IngestOutput, IngestError> {
    // Validate before touching the filesystem.
    let splitter = RecursiveCharacterSplitter::from_config(cfg)?;
    let (docs, stats) = load_directory(&cfg.data_dir, cfg.recursive, loader)?;
    let chunks = splitter.split_documents(&docs);

    Ok(IngestOutput {
        chunks,
        files: stats.files,
        pages: stats.pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    struct LineLoader;

    impl DocumentLoader for LineLoader {
        fn extensions(&self) -> &[&'static str] {
            &["txt"]
        }

        // Each line of the file becomes a page.
        fn load(&self, path: &Path) -> Result<Vec<SourceDocument>, IngestError> {
            let text = fs::read_to_string(path).map_err(|e| IngestError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            Ok(text
                .lines()
                .enumerate()
                .map(|(page, line)| SourceDocument::new(line, path.display().to_string(), page))
                .collect())
        }
    }

    #[test]
    fn ingest_directory_chunks_every_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("notes.txt"),
            "alpha beta gamma delta\nepsilon zeta",
        )
        .unwrap();

        let cfg = IngestConfig::default()
            .with_data_dir(dir.path())
            .with_chunking(12, 0);
        let output = ingest_directory(&cfg, &LineLoader).unwrap();

        assert_eq!(output.files, 1);
        assert_eq!(output.pages, 2);
        let texts: Vec<_> = output.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha beta", "gamma delta", "epsilon zeta"]);
        assert_eq!(output.chunks[2].page, 1);
        assert_eq!(output.chunks[2].chunk_index, 0);
    }

    #[test]
    fn invalid_config_fails_before_loading() {
        let cfg = IngestConfig::default()
            .with_data_dir("/does/not/exist")
            .with_chunking(10, 20);
        let err = ingest_directory(&cfg, &PdfLoader).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn same_input_gives_same_chunks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one two three four five six seven").unwrap();
        let cfg = IngestConfig::default()
            .with_data_dir(dir.path())
            .with_chunking(10, 4);

        let first = ingest_directory(&cfg, &LineLoader).unwrap();
        let second = ingest_directory(&cfg, &LineLoader).unwrap();
        assert_eq!(first.chunks, second.chunks);
    }
}
