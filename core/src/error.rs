use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Text could not be pulled out of one document. Non-fatal during a build.
    #[error("failed to extract text from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("no index found at {path}; run again with --update to build it")]
    MissingIndex { path: PathBuf },

    #[error("index at {path} is unreadable ({reason}); run again with --update to rebuild it")]
    CorruptIndex { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::CorruptIndex { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::Extraction { path: path.into(), reason: reason.into() }
    }
}
