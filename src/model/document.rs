//! Normalized result documents consumed by the report renderer
//!
//! Field names are part of the on-disk contract and serialize in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{COPYRIGHT_YEAR, DEFAULT_PERCENT_CLASS, SUITE_TIMEOUT_PLACEHOLDER};

/// Outcome bucket a test case is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Pass,
    Pending,
    Failed,
}

/// Normalized test state
///
/// The host reports failures as `fail`; documents always carry `failed`.
/// Unrecognized states are kept verbatim and belong to no bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestState {
    Pass,
    Failed,
    Pending,
    Other(String),
}

impl TestState {
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "pass" => TestState::Pass,
            "fail" | "failed" => TestState::Failed,
            "pending" => TestState::Pending,
            other => TestState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TestState::Pass => "pass",
            TestState::Failed => "failed",
            TestState::Pending => "pending",
            TestState::Other(raw) => raw,
        }
    }

    pub fn bucket(&self) -> Option<Bucket> {
        match self {
            TestState::Pass => Some(Bucket::Pass),
            TestState::Failed => Some(Bucket::Failed),
            TestState::Pending => Some(Bucket::Pending),
            TestState::Other(_) => None,
        }
    }
}

impl Serialize for TestState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(TestState::normalize(&raw))
    }
}

/// A single test outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub title: String,
    pub full_title: String,
    pub timed_out: bool,
    pub duration: u64,
    pub state: TestState,
    pub speed: String,
    pub pass: bool,
    pub fail: bool,
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub err: serde_json::Map<String, serde_json::Value>,
    pub is_root: bool,
    pub uuid: String,
    #[serde(rename = "parentUUID")]
    pub parent_uuid: String,
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_error: Option<String>,
}

/// A suite node in the result tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub title: String,
    pub suites: Vec<TestSuite>,
    pub tests: Vec<TestCase>,
    pub pending: Vec<TestCase>,
    pub root: bool,
    #[serde(rename = "_timeout")]
    pub timeout: u64,
    pub file: String,
    pub uuid: String,
    pub full_file: String,
    pub passes: Vec<TestCase>,
    pub failures: Vec<TestCase>,
    pub skipped: Vec<TestCase>,
    pub has_suites: bool,
    pub has_tests: bool,
    pub total_tests: u64,
    pub total_passes: u64,
    pub total_failures: u64,
    pub total_pending: u64,
    pub total_skipped: u64,
    pub has_passes: bool,
    pub has_failures: bool,
    pub has_pending: bool,
    pub has_skipped: bool,
    pub duration: u64,
}

impl TestSuite {
    /// The synthetic root: blank title, file and uuid, holding real suites as children
    pub fn root() -> Self {
        let mut suite = Self::content(String::new(), String::new(), String::new(), 0);
        suite.root = true;
        suite
    }

    /// An ordinary suite with no tests routed into it yet
    pub fn content(title: String, file: String, uuid: String, duration: u64) -> Self {
        Self {
            title,
            suites: Vec::new(),
            tests: Vec::new(),
            pending: Vec::new(),
            root: false,
            timeout: SUITE_TIMEOUT_PLACEHOLDER,
            full_file: file.clone(),
            file,
            uuid,
            passes: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            has_suites: false,
            has_tests: false,
            total_tests: 0,
            total_passes: 0,
            total_failures: 0,
            total_pending: 0,
            total_skipped: 0,
            has_passes: false,
            has_failures: false,
            has_pending: false,
            has_skipped: false,
            duration,
        }
    }

    /// Recompute every derived `has*` / `totalTests` field from the lists.
    pub fn refresh_flags(&mut self) {
        self.total_tests = self.tests.len() as u64;
        self.has_tests = !self.tests.is_empty();
        self.has_suites = !self.suites.is_empty();
        self.has_passes = self.total_passes > 0;
        self.has_failures = self.total_failures > 0;
        self.has_pending = self.total_pending > 0;
        self.has_skipped = self.total_skipped > 0;
    }
}

/// Summary statistics for a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    pub duration: u64,
    pub tests_registered: u64,
    pub tests: u64,
    pub suites: u64,
    pub passes: u64,
    pub pending: u64,
    pub failures: u64,
    pub pass_percent: f64,
    pub pending_percent: f64,
    #[serde(default)]
    pub other: u64,
    #[serde(default)]
    pub has_other: bool,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub has_skipped: bool,
    #[serde(default = "default_percent_class")]
    pub pass_percent_class: String,
    #[serde(default = "default_percent_class")]
    pub pending_percent_class: String,
}

fn default_percent_class() -> String {
    DEFAULT_PERCENT_CLASS.to_string()
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            duration: 0,
            tests_registered: 0,
            tests: 0,
            suites: 0,
            passes: 0,
            pending: 0,
            failures: 0,
            pass_percent: 0.0,
            pending_percent: 0.0,
            other: 0,
            has_other: false,
            skipped: 0,
            has_skipped: false,
            pass_percent_class: default_percent_class(),
            pending_percent_class: default_percent_class(),
        }
    }
}

/// Share of `part` in `whole` as a percentage; zero when there is nothing to divide
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Aggregate bucket counters; pending tests are counted as skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

/// A result document
///
/// Per-worker documents index test cases directly (`ResultSet`). The merged
/// document keeps one nested list per source document ([`MasterResultSet`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet<T = TestCase> {
    pub stats: Stats,
    #[serde(default)]
    pub state: RunState,
    pub suites: TestSuite,
    pub all_tests: Vec<T>,
    pub all_passes: Vec<T>,
    pub all_pending: Vec<T>,
    pub all_failures: Vec<T>,
    #[serde(default = "default_copyright_year")]
    pub copyright_year: u32,
}

fn default_copyright_year() -> u32 {
    COPYRIGHT_YEAR
}

pub type MasterResultSet = ResultSet<Vec<TestCase>>;

impl<T> ResultSet<T> {
    /// A document with zeroed counters and an empty synthetic root
    pub fn empty() -> Self {
        Self {
            stats: Stats::default(),
            state: RunState::default(),
            suites: TestSuite::root(),
            all_tests: Vec::new(),
            all_passes: Vec::new(),
            all_pending: Vec::new(),
            all_failures: Vec::new(),
            copyright_year: COPYRIGHT_YEAR,
        }
    }
}

impl ResultSet {
    /// Route one test case into its bucket on both the suite and the document.
    ///
    /// Every case lands in `allTests` and the suite's `tests`; only recognized
    /// states reach a bucket list, a bucket total and the run state counters.
    pub fn route(&mut self, suite: &mut TestSuite, case: TestCase) {
        match case.state.bucket() {
            Some(Bucket::Pending) => {
                self.state.skipped += 1;
                self.all_pending.push(case.clone());
                suite.skipped.push(case.clone());
                suite.total_pending += 1;
            }
            Some(Bucket::Pass) => {
                self.state.passed += 1;
                self.all_passes.push(case.clone());
                suite.passes.push(case.clone());
                suite.total_passes += 1;
            }
            Some(Bucket::Failed) => {
                self.state.failed += 1;
                self.all_failures.push(case.clone());
                suite.failures.push(case.clone());
                suite.total_failures += 1;
            }
            None => {}
        }

        self.all_tests.push(case.clone());
        suite.tests.push(case);
        suite.refresh_flags();
    }
}
