use derive_builder::Builder;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::identity::IdClock;
use super::merger::merge_documents;
use super::tree_builder::build_result_set;
use crate::config::DEFAULT_REPORT_FILENAME;
use crate::error::ReportError;
use crate::model::{RunRecord, RunTimings, RunnerInfo, Stats};
use crate::render::ReportRenderer;
use crate::storage::{ReportStorage, is_document_filename};
use crate::telemetry::{AggregationEvent, ProgressStats};

/// Configuration for one aggregation run
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunConfig {
    #[builder(setter(into))]
    pub output_dir: PathBuf,
    #[builder(setter(into), default = "DEFAULT_REPORT_FILENAME.to_string()")]
    pub report_filename: String,
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref name) = self.report_filename {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err(format!("Invalid report filename '{}'", name));
            }
            if is_document_filename(name) {
                return Err(format!(
                    "Report filename '{}' would be read back as a worker document",
                    name
                ));
            }
        }
        Ok(())
    }
}

/// Result of merging and rendering the persisted documents
#[derive(Debug)]
pub struct MergeOutcome {
    pub report_path: PathBuf,
    pub documents: Vec<PathBuf>,
    pub stats: Stats,
}

/// Result of a complete build, persist and merge run
#[derive(Debug)]
pub struct RunOutcome {
    /// Documents written during this run, in worker order
    pub written: Vec<PathBuf>,
    pub merge: MergeOutcome,
    pub progress: ProgressStats,
}

/// The Coordinator drives the per-worker build and the final merge.
pub struct Coordinator {
    storage: Arc<dyn ReportStorage>,
    renderer: Arc<dyn ReportRenderer>,
}

impl Coordinator {
    pub fn new(storage: Arc<dyn ReportStorage>, renderer: Arc<dyn ReportRenderer>) -> Self {
        Self { storage, renderer }
    }

    /// Run the complete aggregation
    ///
    /// 1. Build and persist one document per worker, in input order
    /// 2. Abort if any worker produced no document
    /// 3. Read back every persisted document, merge and render
    pub async fn run(
        &self,
        record: RunRecord,
        config: &RunConfig,
    ) -> Result<RunOutcome, ReportError> {
        let timings = record.timings();
        let mut clock = IdClock::new();
        let mut progress = ProgressStats::new();
        let mut written = Vec::new();
        let mut failed = Vec::new();

        info!("Processing {} workers", record.runners.len());

        for (worker_id, value) in record.runners {
            match self
                .process_worker(&worker_id, value, &timings, &mut clock, &mut progress)
                .await
            {
                Ok(path) => {
                    progress.update(&AggregationEvent::DocumentPersisted);
                    written.push(path);
                }
                Err(e) => {
                    let kind = e.kind();
                    let error = anyhow::Error::new(e);
                    warn!(?kind, "No document for worker {}: {:#}", worker_id, error);
                    progress.update(&AggregationEvent::WorkerFailed);
                    failed.push(worker_id);
                }
            }
        }

        if let (Some(p50), Some(p99)) = (progress.percentile(50.0), progress.percentile(99.0)) {
            info!("Document build time p50: {}us, p99: {}us", p50, p99);
        }

        info!(
            "Built {} documents covering {} tests, {} persisted",
            progress.workers_built, progress.tests_seen, progress.documents_persisted
        );

        if !failed.is_empty() {
            warn!(
                "{} worker(s) produced no document; skipping merge",
                progress.workers_failed
            );
            return Err(ReportError::MissingDocuments { workers: failed });
        }

        let merge = self.merge_and_render(&written, config).await?;

        Ok(RunOutcome {
            written,
            merge,
            progress,
        })
    }

    /// Merge whatever documents are already persisted, without building any
    pub async fn merge_existing(&self, config: &RunConfig) -> Result<MergeOutcome, ReportError> {
        self.merge_and_render(&[], config).await
    }

    async fn process_worker(
        &self,
        worker_id: &str,
        value: serde_json::Value,
        timings: &RunTimings,
        clock: &mut IdClock,
        progress: &mut ProgressStats,
    ) -> Result<PathBuf, ReportError> {
        let runner = RunnerInfo::decode(worker_id, value)?;

        let started = Instant::now();
        let document = build_result_set(worker_id, &runner, timings, clock)?;
        progress.update(&AggregationEvent::DocumentBuilt {
            tests: document.stats.tests,
            build_micros: started.elapsed().as_micros() as u64,
        });

        self.storage
            .persist(worker_id, &runner.sanitized_capabilities, &document)
            .await
    }

    async fn merge_and_render(
        &self,
        expected: &[PathBuf],
        config: &RunConfig,
    ) -> Result<MergeOutcome, ReportError> {
        let persisted = self.storage.list_persisted().await?;

        for path in expected {
            if !persisted.iter().any(|d| &d.path == path) {
                return Err(ReportError::DocumentNotListed {
                    path: path.clone(),
                    dir: self.storage.location().to_path_buf(),
                });
            }
        }

        let master = merge_documents(persisted.iter().map(|d| &d.document));
        let report_path = self.renderer.render(&master, &config.output_dir).await?;

        info!(
            "Merge complete: {} documents, {} tests ({} passed, {} failed, {} pending)",
            persisted.len(),
            master.stats.tests,
            master.stats.passes,
            master.stats.failures,
            master.stats.pending
        );

        Ok(MergeOutcome {
            report_path,
            documents: persisted.into_iter().map(|d| d.path).collect(),
            stats: master.stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfigBuilder::default()
            .output_dir("/tmp/reports")
            .build()
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.report_filename, "wdio-merged-report.json");
    }

    #[test]
    fn test_run_config_rejects_colliding_filename() {
        let result = RunConfigBuilder::default()
            .output_dir("/tmp/reports")
            .report_filename("WDIO.json.merged.json")
            .build();
        assert!(result.is_err());

        let result = RunConfigBuilder::default()
            .output_dir("/tmp/reports")
            .report_filename("nested/report.json")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_run_config_requires_output_dir() {
        assert!(RunConfigBuilder::default().build().is_err());
    }
}
