//! Persistence of per-worker result documents

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{DOCUMENT_PREFIX, DOCUMENT_SUFFIX, UNKNOWN_CAPABILITIES_LABEL};
use crate::error::ReportError;
use crate::model::ResultSet;

/// A per-worker document read back from storage, with where it came from
#[derive(Debug, Clone)]
pub struct PersistedDocument {
    pub path: PathBuf,
    pub document: ResultSet,
}

/// Trait for result document storage
///
/// The coordinator writes one document per worker and later reads all of
/// them back for merging. Implementations must never overwrite an existing
/// document.
#[async_trait::async_trait]
pub trait ReportStorage: Send + Sync {
    /// Write one worker's document and return its location
    async fn persist(
        &self,
        worker_id: &str,
        capabilities: &str,
        document: &ResultSet,
    ) -> Result<PathBuf, ReportError>;

    /// Read a single persisted document
    async fn read_document(&self, path: &Path) -> Result<ResultSet, ReportError>;

    /// Read every persisted document, in listing order
    async fn list_persisted(&self) -> Result<Vec<PersistedDocument>, ReportError>;

    /// Directory the documents live in
    fn location(&self) -> &Path;
}

/// Local filesystem implementation of ReportStorage
///
/// Directory structure:
///   {output_dir}/WDIO.json.{capabilities}.{uuid}.json
pub struct LocalReportStorage {
    output_dir: PathBuf,
}

impl LocalReportStorage {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Fresh, collision-free filename for a worker document
    fn document_filename(capabilities: &str) -> String {
        format!(
            "{}{}.{}{}",
            DOCUMENT_PREFIX,
            capabilities_label(capabilities),
            Uuid::new_v4(),
            DOCUMENT_SUFFIX
        )
    }
}

/// Filesystem-safe label derived from a worker's sanitized capabilities
pub fn capabilities_label(capabilities: &str) -> String {
    let label: String = capabilities
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if label.is_empty() {
        UNKNOWN_CAPABILITIES_LABEL.to_string()
    } else {
        label
    }
}

/// Hidden sibling the document is staged in; never matches the document pattern
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Write `bytes` so that `path` either holds the whole document or does not exist.
///
/// The document is staged under a hidden name, then hard-linked into place,
/// which fails rather than clobbering an existing file. The staging file is
/// removed on every path.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let staging = staging_path(path);
    let result = stage_and_publish(&staging, path, bytes).await;

    if let Err(e) = fs::remove_file(&staging).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to remove staging file {}: {}", staging.display(), e);
    }

    result
}

async fn stage_and_publish(staging: &Path, path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(staging)
        .await
        .map_err(|e| ReportError::io("create staging file", staging, e))?;

    file.write_all(bytes)
        .await
        .map_err(|e| ReportError::io("write document", staging, e))?;
    file.sync_all()
        .await
        .map_err(|e| ReportError::io("flush document", staging, e))?;
    drop(file);

    fs::hard_link(staging, path)
        .await
        .map_err(|e| ReportError::io("publish document", path, e))
}

pub fn is_document_filename(name: &str) -> bool {
    name.len() > DOCUMENT_PREFIX.len() + DOCUMENT_SUFFIX.len()
        && name.starts_with(DOCUMENT_PREFIX)
        && name.ends_with(DOCUMENT_SUFFIX)
}

#[async_trait::async_trait]
impl ReportStorage for LocalReportStorage {
    async fn persist(
        &self,
        worker_id: &str,
        capabilities: &str,
        document: &ResultSet,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ReportError::io("create output directory", &self.output_dir, e))?;

        let path = self
            .output_dir
            .join(Self::document_filename(capabilities));

        let json = serde_json::to_string(document).map_err(|source| ReportError::Encode {
            path: path.clone(),
            source,
        })?;

        write_atomically(&path, json.as_bytes()).await?;

        info!(
            "Wrote json report for worker {} to [{}]",
            worker_id,
            path.display()
        );
        Ok(path)
    }

    async fn read_document(&self, path: &Path) -> Result<ResultSet, ReportError> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ReportError::io("read document", path, e))?;

        serde_json::from_str(&contents).map_err(|e| ReportError::decode(path, e))
    }

    async fn list_persisted(&self) -> Result<Vec<PersistedDocument>, ReportError> {
        let mut entries = fs::read_dir(&self.output_dir)
            .await
            .map_err(|e| ReportError::io("list output directory", &self.output_dir, e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ReportError::io("list output directory", &self.output_dir, e))?
        {
            let name = entry.file_name();
            if name.to_str().is_some_and(is_document_filename) {
                paths.push(entry.path());
            }
        }
        paths.sort();

        debug!(
            "Found {} documents in {}",
            paths.len(),
            self.output_dir.display()
        );

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let document = self.read_document(&path).await?;
            documents.push(PersistedDocument { path, document });
        }

        Ok(documents)
    }

    fn location(&self) -> &Path {
        &self.output_dir
    }
}
