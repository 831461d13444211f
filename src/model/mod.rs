//! Data model: raw host input and the normalized documents built from it

pub mod document;
pub mod raw;

pub use document::{MasterResultSet, ResultSet, Stats, TestCase, TestState, TestSuite, percent};
pub use raw::{RunRecord, RunTimings, RunnerInfo, Suite, Test};
