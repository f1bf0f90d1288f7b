//! Page text extraction and folder discovery.
//!
//! The default extractor shells out to poppler's `pdftotext`, which separates
//! pages with form feeds. Anything implementing [`PageExtractor`] can stand in
//! for it.

use crate::builder::{PageText, SourceDocument};
use crate::error::IndexError;
use crate::index::PageNumber;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Name of the directory, inside the indexed folder, that holds the persisted index.
pub const INDEX_DIR_NAME: &str = ".pdfsearch";

pub trait PageExtractor {
    /// Pages of the document at `path`, numbered from 1 and contiguous.
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IndexError>;
}

/// Extraction through the `pdftotext` binary.
#[derive(Debug, Clone)]
pub struct PdfToText {
    binary: PathBuf,
}

impl Default for PdfToText {
    fn default() -> Self {
        Self { binary: PathBuf::from("pdftotext") }
    }
}

impl PdfToText {
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

impl PageExtractor for PdfToText {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IndexError> {
        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| {
                IndexError::extraction(path, format!("cannot run {}: {e} (is poppler installed?)", self.binary.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IndexError::extraction(path, format!("pdftotext failed: {}", stderr.trim())));
        }

        // A scanned PDF without a text layer still counts as a document.
        let text = String::from_utf8_lossy(&output.stdout);
        if text.trim().is_empty() {
            tracing::warn!(path = %path.display(), "no extractable text, indexing as empty");
        }
        Ok(split_pages(&text))
    }
}

/// Split `pdftotext` output on form feeds. The feed after the last page does not start a new one.
pub fn split_pages(text: &str) -> Vec<PageText> {
    let body = text.strip_suffix('\u{c}').unwrap_or(text);
    body.split('\u{c}')
        .enumerate()
        .map(|(i, page)| PageText::new(i as PageNumber + 1, page))
        .collect()
}

/// Result of walking a folder for PDFs.
#[derive(Debug, Default)]
pub struct PdfListing {
    /// PDF files, sorted.
    pub files: Vec<PathBuf>,
    /// Entries the walk could not read (unreadable directories, dangling links).
    pub unreadable: Vec<SkippedDocument>,
}

/// PDF files under `root`, skipping the index directory. Symlinks are followed.
pub fn discover_pdfs(root: &Path) -> PdfListing {
    let mut listing = PdfListing::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != INDEX_DIR_NAME);
    for entry in walker {
        match entry {
            Ok(e) if e.file_type().is_file() && is_pdf(e.path()) => listing.files.push(e.into_path()),
            Ok(_) => {}
            Err(e) => {
                let name = e.path().map(|p| document_name(root, p)).unwrap_or_else(|| root.display().to_string());
                tracing::warn!(entry = %name, error = %e, "cannot read folder entry");
                listing.unreadable.push(SkippedDocument { name, reason: e.to_string() });
            }
        }
    }
    listing.files.sort();
    listing
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// A document that could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<SourceDocument>,
    pub skipped: Vec<SkippedDocument>,
}

/// Extract every PDF under `root`. Unreadable entries and failed extractions are
/// logged and recorded in `skipped`, never fatal.
pub fn collect_documents(root: &Path, extractor: &dyn PageExtractor) -> IngestReport {
    let listing = discover_pdfs(root);
    let mut report = IngestReport { skipped: listing.unreadable, ..Default::default() };
    for path in listing.files {
        let name = document_name(root, &path);
        tracing::info!(document = %name, "processing");
        match extractor.extract_pages(&path) {
            Ok(pages) => {
                tracing::debug!(document = %name, num_pages = pages.len(), "extracted");
                report.documents.push(SourceDocument::new(name, pages));
            }
            Err(e) => {
                tracing::warn!(document = %name, error = %e, "skipping document");
                report.skipped.push(SkippedDocument { name, reason: e.to_string() });
            }
        }
    }
    report
}

/// Identifier of a document: its path relative to the indexed folder, `/`-separated.
pub fn document_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
