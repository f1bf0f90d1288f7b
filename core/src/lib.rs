//! TF-IDF search over the pages of a folder of PDFs.
//!
//! Extraction produces per-page text, [`IndexBuilder`] turns it into an
//! [`InvertedIndex`], [`persist`] stores it, and [`search`] ranks documents
//! for a free-text query.

pub mod builder;
pub mod error;
pub mod extract;
pub mod index;
pub mod persist;
pub mod search;
pub mod tokenizer;
pub mod weight;

pub use builder::{build, IndexBuilder, PageText, SourceDocument};
pub use error::IndexError;
pub use extract::{collect_documents, discover_pdfs, IngestReport, PageExtractor, PdfListing, PdfToText, SkippedDocument};
pub use index::{DocId, DocMeta, InvertedIndex, PageNumber, Posting, TermId};
pub use search::{search, search_top_k, QueryVector, SearchHit};
pub use weight::{IdfVariant, IndexConfig};
