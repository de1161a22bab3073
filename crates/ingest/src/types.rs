//! Document and chunk records flowing out of the ingest stage.
use serde::{Deserialize, Serialize};

/// Text of a single PDF page together with where it came from.
///
/// Pages are numbered from zero, matching the order reported by the PDF
/// reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    /// Path of the originating file as discovered under the data directory.
    pub source: String,
    pub page: usize,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            page,
        }
    }
}

/// A contiguous, possibly overlapping, slice of a page's text.
///
/// Chunks are immutable once produced. `id` is stable across runs for the
/// same input and chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: usize,
    /// Position of the chunk within its page.
    pub chunk_index: usize,
    /// Character offset of the chunk within the page text, when it could be
    /// located.
    pub start_index: Option<usize>,
}

impl DocumentChunk {
    pub(crate) fn from_page(
        doc: &SourceDocument,
        chunk_index: usize,
        text: String,
        start_index: Option<usize>,
    ) -> Self {
        Self {
            id: chunk_id(&doc.source, doc.page, chunk_index),
            text,
            source: doc.source.clone(),
            page: doc.page,
            chunk_index,
            start_index,
        }
    }

    /// Number of characters in the chunk text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Builds the deterministic identifier `<source>#p<page>#c<index>`.
pub fn chunk_id(source: &str, page: usize, chunk_index: usize) -> String {
    format!("{source}#p{page}#c{chunk_index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_stable() {
        assert_eq!(chunk_id("data/a.pdf", 3, 1), "data/a.pdf#p3#c1");
        let doc = SourceDocument::new("text", "data/a.pdf", 3);
        let chunk = DocumentChunk::from_page(&doc, 1, "text".into(), Some(0));
        assert_eq!(chunk.id, chunk_id("data/a.pdf", 3, 1));
        assert_eq!(chunk.char_len(), 4);
    }
}
