//! Hand-off of the merged document to the report renderer

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::config::DEFAULT_REPORT_FILENAME;
use crate::error::ReportError;
use crate::model::MasterResultSet;

/// Trait for consumers of the merged document
#[async_trait::async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render the merged document into `output_dir`, returning the produced file
    async fn render(
        &self,
        master: &MasterResultSet,
        output_dir: &Path,
    ) -> Result<PathBuf, ReportError>;
}

/// Writes the merged document as JSON for an external HTML templater
pub struct JsonReportRenderer {
    filename: String,
}

impl Default for JsonReportRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_FILENAME)
    }
}

impl JsonReportRenderer {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

#[async_trait::async_trait]
impl ReportRenderer for JsonReportRenderer {
    async fn render(
        &self,
        master: &MasterResultSet,
        output_dir: &Path,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ReportError::io("create output directory", output_dir, e))?;

        let path = output_dir.join(&self.filename);
        let json = serde_json::to_string_pretty(master).map_err(|source| ReportError::Encode {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, json)
            .await
            .map_err(|e| ReportError::io("write merged report", &path, e))?;

        info!("Wrote merged report to [{}]", path.display());
        Ok(path)
    }
}
