//! Character-window chunking on top of [`text_splitter`].
//!
//! Text is cut at the coarsest semantic boundary that still fits the window
//! (line breaks, then sentences, then words, then graphemes, then characters)
//! and neighbouring sections are packed together up to `chunk_size`. Up to
//! `chunk_overlap` characters of the previous chunk are repeated at the start
//! of the next one.
//!
//! All lengths and offsets are measured in Unicode scalar values (`char`s).
//!
//! ```rust
//! use ingest::RecursiveCharacterSplitter;
//!
//! let splitter = RecursiveCharacterSplitter::new(10, 0).unwrap();
//! let chunks = splitter.split_text("one two three four five");
//! assert_eq!(chunks, vec!["one two", "three four", "five"]);
//! ```
use std::fmt;

use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::debug;

use crate::config::{ConfigError, IngestConfig};
use crate::error::IngestError;
use crate::types::{DocumentChunk, SourceDocument};

pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    splitter: TextSplitter<Characters>,
}

impl fmt::Debug for RecursiveCharacterSplitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursiveCharacterSplitter")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}

impl RecursiveCharacterSplitter {
    /// Splitter with whitespace trimming and the given window.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        Self::from_config(&IngestConfig::default().with_chunking(chunk_size, chunk_overlap))
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestError> {
        config.validate()?;
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|_| ConfigError::OverlapTooLarge {
                chunk_size: config.chunk_size,
                chunk_overlap: config.chunk_overlap,
            })?
            .with_trim(config.strip_whitespace);

        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            splitter: TextSplitter::new(chunk_config),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.chunks(text).map(|(_, chunk)| chunk.to_string()).collect()
    }

    /// Splits one page into chunks carrying the page's provenance.
    pub fn split_document(&self, doc: &SourceDocument) -> Vec<DocumentChunk> {
        let chunks: Vec<DocumentChunk> = self
            .chunks(&doc.text)
            .enumerate()
            .map(|(chunk_index, (byte_offset, text))| {
                let start_index = doc.text[..byte_offset].chars().count();
                DocumentChunk::from_page(doc, chunk_index, text.to_string(), Some(start_index))
            })
            .collect();

        debug!(
            source = %doc.source,
            page = doc.page,
            chunks = chunks.len(),
            "page_split"
        );
        chunks
    }

    /// Splits every page, preserving page order.
    pub fn split_documents(&self, docs: &[SourceDocument]) -> Vec<DocumentChunk> {
        docs.iter().flat_map(|doc| self.split_document(doc)).collect()
    }

    /// Non-blank chunks with their byte offsets into `text`.
    fn chunks<'t>(&'t self, text: &'t str) -> impl Iterator<Item = (usize, &'t str)> + 't {
        self.splitter
            .chunk_indices(text)
            .filter(|(_, chunk)| !chunk.trim().is_empty())
    }
}
