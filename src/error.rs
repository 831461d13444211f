//! Error taxonomy for building, persisting and merging result documents

use std::path::PathBuf;

use thiserror::Error;

/// Broad classification of a [`ReportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input did not have the shape the engine requires
    Structural,
    /// The output directory could not be written or read back
    Persistence,
}

/// An error raised while producing or merging result documents.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("malformed run record for worker '{worker_id}': {reason}")]
    MalformedRunRecord { worker_id: String, reason: String },

    #[error("document {} does not match the result schema", path.display())]
    SchemaMismatch {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to {action} {}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {} is not valid JSON", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document for {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("merge aborted: no document was produced for worker(s) {}", workers.join(", "))]
    MissingDocuments { workers: Vec<String> },

    #[error("document {} written during this run is missing from {}", path.display(), dir.display())]
    DocumentNotListed { path: PathBuf, dir: PathBuf },
}

impl ReportError {
    pub fn malformed(worker_id: &str, reason: impl Into<String>) -> Self {
        ReportError::MalformedRunRecord {
            worker_id: worker_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Classify a decode failure of a persisted document.
    ///
    /// Well-formed JSON with the wrong shape is a structural error; anything
    /// that could not be parsed at all is treated as an unreadable file.
    pub fn decode(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        let path = path.into();
        if source.is_data() {
            ReportError::SchemaMismatch { path, source }
        } else {
            ReportError::Unreadable { path, source }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReportError::MalformedRunRecord { .. } | ReportError::SchemaMismatch { .. } => {
                ErrorKind::Structural
            }
            ReportError::Io { .. }
            | ReportError::Unreadable { .. }
            | ReportError::Encode { .. }
            | ReportError::MissingDocuments { .. }
            | ReportError::DocumentNotListed { .. } => ErrorKind::Persistence,
        }
    }
}
