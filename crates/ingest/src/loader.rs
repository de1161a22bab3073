//! Document discovery and page extraction.
//!
//! [`load_directory`] walks the data directory in sorted path order and hands
//! every file with a matching extension to a [`DocumentLoader`]. The default
//! loader, [`PdfLoader`], produces one [`SourceDocument`] per page that has
//! extractable text.
use std::path::{Path, PathBuf};

use pdf_oxide::converters::ConversionOptions;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::IngestError;
use crate::types::SourceDocument;

/// Turns one file into page documents.
pub trait DocumentLoader: Send + Sync {
    /// Lower-case file extensions (without the dot) this loader accepts.
    fn extensions(&self) -> &[&'static str];

    fn load(&self, path: &Path) -> Result<Vec<SourceDocument>, IngestError>;
}

/// Reads PDFs page by page.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    fn options() -> ConversionOptions {
        ConversionOptions {
            include_images: false,
            ..ConversionOptions::default()
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn load(&self, path: &Path) -> Result<Vec<SourceDocument>, IngestError> {
        let source = path.display().to_string();
        let mut doc =
            pdf_oxide::PdfDocument::open(path).map_err(|e| IngestError::pdf(&source, e))?;
        let page_count = doc.page_count().map_err(|e| IngestError::pdf(&source, e))?;
        let options = Self::options();

        let mut pages = Vec::with_capacity(page_count);
        for page in 0..page_count {
            let text = doc
                .to_markdown(page, &options)
                .map_err(|e| IngestError::pdf(&source, e))?;
            if text.trim().is_empty() {
                debug!(source = %source, page, "pdf_page_empty");
                continue;
            }
            pages.push(SourceDocument::new(text, source.clone(), page));
        }
        Ok(pages)
    }
}

/// Summary of a directory load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub pages: usize,
}

/// Lists files under `dir` whose extension matches one of `extensions`,
/// case-insensitively, sorted by path.
pub fn discover_files(
    dir: &Path,
    recursive: bool,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound(dir.display().to_string()));
    }

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| IngestError::io(dir.display().to_string(), e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
            .unwrap_or(false);
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Loads every matching document under `dir`.
///
/// Fails with [`IngestError::NoDocuments`] when nothing matches, and aborts on
/// the first file that cannot be read.
pub fn load_directory(
    dir: &Path,
    recursive: bool,
    loader: &dyn DocumentLoader,
) -> Result<(Vec<SourceDocument>, LoadStats), IngestError> {
    let files = discover_files(dir, recursive, loader.extensions())?;
    if files.is_empty() {
        return Err(IngestError::NoDocuments(dir.display().to_string()));
    }

    let mut docs = Vec::new();
    for file in &files {
        let pages = loader.load(file)?;
        debug!(path = %file.display(), pages = pages.len(), "document_loaded");
        docs.extend(pages);
    }

    let stats = LoadStats {
        files: files.len(),
        pages: docs.len(),
    };
    info!(
        dir = %dir.display(),
        files = stats.files,
        pages = stats.pages,
        "directory_loaded"
    );
    Ok((docs, stats))
}
