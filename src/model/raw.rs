//! Raw run statistics as reported by the test-running host
//!
//! These types are read-only input. Mapping order is significant: it decides
//! suite child order and the order of every flat test index, so every keyed
//! collection is an [`IndexMap`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ReportError;

/// Run-wide statistics emitted by the host once every worker has finished
///
/// `runners` maps worker id to that worker's [`RunnerInfo`]. Entries are kept
/// as undecoded JSON so that a malformed record for one worker is reported
/// against that worker only.
#[derive(Debug, Clone, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(rename = "_duration", default)]
    pub duration: u64,
    #[serde(default)]
    pub counts: RunCounts,
    pub runners: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunCounts {
    #[serde(default)]
    pub tests: u64,
}

/// Run-level values copied verbatim into every worker document
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunTimings {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration: u64,
    pub tests_registered: u64,
}

impl RunRecord {
    pub fn timings(&self) -> RunTimings {
        RunTimings {
            start: self.start,
            end: self.end,
            duration: self.duration,
            tests_registered: self.counts.tests,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerInfo {
    pub specs: IndexMap<String, Spec>,
    #[serde(default)]
    pub sanitized_capabilities: String,
}

impl RunnerInfo {
    /// Decode one worker's record, failing fast on any structural problem.
    pub fn decode(worker_id: &str, value: serde_json::Value) -> Result<Self, ReportError> {
        serde_json::from_value(value).map_err(|e| ReportError::malformed(worker_id, e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub files: Vec<String>,
    pub spec_hash: String,
    pub suites: IndexMap<String, Suite>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Suite {
    #[serde(default)]
    pub tests: IndexMap<String, Test>,
    #[serde(default)]
    pub hooks: IndexMap<String, Hook>,
    #[serde(rename = "_duration", default)]
    pub duration: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Test {
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub error: Option<TestError>,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
}

/// A before/after hook; recorded by the host but not part of any count
///
/// Fields are kept as raw JSON so that no hook shape can reject a worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    #[serde(default)]
    pub title: Option<serde_json::Value>,
    #[serde(default)]
    pub start: Option<serde_json::Value>,
    #[serde(default)]
    pub end: Option<serde_json::Value>,
    #[serde(default)]
    pub duration: Option<serde_json::Value>,
    #[serde(default)]
    pub parent: Option<serde_json::Value>,
    #[serde(default)]
    pub current_test: Option<serde_json::Value>,
}
