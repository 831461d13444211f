//! High-level runner API for the report aggregator.
//!
//! This module provides a simplified public interface that wires the storage,
//! renderer and coordinator together.
//!
//! This is the primary API for external users and for the CLI.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use crate::aggregation::{Coordinator, MergeOutcome, RunConfig, RunConfigBuilder};
use crate::model::RunRecord;
use crate::render::JsonReportRenderer;
use crate::storage::LocalReportStorage;

/// Arguments for building, persisting and merging one run
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// JSON run record produced by the test host
    pub input: PathBuf,
    /// Directory receiving the per-worker documents and the merged report
    pub output_dir: PathBuf,
    /// Merged report filename (defaults to `wdio-merged-report.json`)
    pub report_filename: Option<String>,
}

/// Arguments for merging documents already present in a directory
#[derive(Debug, Clone)]
pub struct MergeArgs {
    pub output_dir: PathBuf,
    pub report_filename: Option<String>,
}

/// Summary of a completed run
#[derive(Debug)]
pub struct ReportSummary {
    pub report_path: PathBuf,
    /// Worker documents written by this invocation (zero for a plain merge)
    pub documents_written: usize,
    pub documents_merged: usize,
    pub suites: u64,
    pub tests: u64,
    pub passes: u64,
    pub failures: u64,
    pub pending: u64,
    pub duration_ms: u64,
}

impl ReportSummary {
    fn from_merge(merge: MergeOutcome, documents_written: usize) -> Self {
        Self {
            report_path: merge.report_path,
            documents_written,
            documents_merged: merge.documents.len(),
            suites: merge.stats.suites,
            tests: merge.stats.tests,
            passes: merge.stats.passes,
            failures: merge.stats.failures,
            pending: merge.stats.pending,
            duration_ms: merge.stats.duration,
        }
    }
}

/// Build one document per worker from a run record, then merge and render them
///
/// # Example
///
/// ```no_run
/// use suite_aggregator::runner::{ReportArgs, run_report};
///
/// # async fn example() -> anyhow::Result<()> {
/// let args = ReportArgs {
///     input: "wdio-run.json".into(),
///     output_dir: "reports".into(),
///     report_filename: None,
/// };
///
/// let summary = run_report(args).await?;
/// println!("{} tests, {} failed", summary.tests, summary.failures);
/// # Ok(())
/// # }
/// ```
pub async fn run_report(args: ReportArgs) -> Result<ReportSummary> {
    let contents = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read run record {}", args.input.display()))?;
    let record: RunRecord =
        serde_json::from_str(&contents).context("Failed to parse run record")?;

    let config = run_config(args.output_dir, args.report_filename)?;
    let coordinator = coordinator(&config);

    let outcome = coordinator
        .run(record, &config)
        .await
        .with_context(|| format!("Report run failed in {}", config.output_dir.display()))?;

    Ok(ReportSummary::from_merge(outcome.merge, outcome.written.len()))
}

/// Merge the worker documents already persisted in a directory
pub async fn run_merge(args: MergeArgs) -> Result<ReportSummary> {
    let config = run_config(args.output_dir, args.report_filename)?;
    let coordinator = coordinator(&config);

    let merge = coordinator
        .merge_existing(&config)
        .await
        .with_context(|| format!("Merge failed in {}", config.output_dir.display()))?;

    Ok(ReportSummary::from_merge(merge, 0))
}

fn run_config(output_dir: PathBuf, report_filename: Option<String>) -> Result<RunConfig> {
    let mut builder = RunConfigBuilder::default();
    builder.output_dir(output_dir);
    if let Some(filename) = report_filename {
        builder.report_filename(filename);
    }
    builder.build().context("Invalid run configuration")
}

fn coordinator(config: &RunConfig) -> Coordinator {
    let storage = Arc::new(LocalReportStorage::new(config.output_dir.clone()));
    let renderer = Arc::new(JsonReportRenderer::new(config.report_filename.clone()));
    Coordinator::new(storage, renderer)
}
