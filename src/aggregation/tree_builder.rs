//! Builds one worker's result document from its raw run record

use tracing::{debug, trace};

use super::identity::{IdClock, SuiteRole};
use crate::config::DEFAULT_SPEED;
use crate::error::ReportError;
use crate::model::{
    ResultSet, RunTimings, RunnerInfo, Suite, Test, TestCase, TestState, TestSuite, percent,
};

/// Build a normalized [`ResultSet`] for one worker.
///
/// Specs and suites are visited in input order. The first suite of every spec
/// is the host's wrapper: its duration is folded into the synthetic root and
/// its own tests are dropped. All later suites become children of the root.
pub fn build_result_set(
    worker_id: &str,
    runner: &RunnerInfo,
    timings: &RunTimings,
    clock: &mut IdClock,
) -> Result<ResultSet, ReportError> {
    let mut result_set: ResultSet = ResultSet::empty();
    result_set.stats.start = timings.start;
    result_set.stats.end = timings.end;
    result_set.stats.duration = timings.duration;
    result_set.stats.tests_registered = timings.tests_registered;

    for (spec_id, spec) in &runner.specs {
        let file = spec.files.first().ok_or_else(|| {
            ReportError::malformed(worker_id, format!("spec '{spec_id}' lists no files"))
        })?;

        for (position, (suite_name, suite)) in spec.suites.iter().enumerate() {
            match SuiteRole::for_position(position) {
                SuiteRole::Wrapper => {
                    if !suite.tests.is_empty() {
                        debug!(
                            "Dropping {} test(s) reported on wrapper suite '{}' of spec {}",
                            suite.tests.len(),
                            suite_name,
                            spec_id
                        );
                    }
                    result_set.suites.duration += suite.duration;
                }
                SuiteRole::Content => {
                    let test_suite = build_suite(
                        &mut result_set,
                        suite_name,
                        suite,
                        file,
                        &spec.spec_hash,
                        clock,
                    );
                    result_set.suites.suites.push(test_suite);
                }
            }
        }
    }

    result_set.suites.refresh_flags();
    finalize_stats(&mut result_set);

    debug!(
        "Built document for worker {}: {} suites, {} tests",
        worker_id, result_set.stats.suites, result_set.stats.tests
    );

    Ok(result_set)
}

fn build_suite(
    result_set: &mut ResultSet,
    suite_name: &str,
    suite: &Suite,
    file: &str,
    spec_hash: &str,
    clock: &mut IdClock,
) -> TestSuite {
    let mut test_suite = TestSuite::content(
        suite_name.to_string(),
        file.to_string(),
        spec_hash.to_string(),
        suite.duration,
    );

    // Hooks are not part of the document yet
    for (hook_name, hook) in &suite.hooks {
        trace!(
            hook = %hook_name,
            title = ?hook.title,
            parent = ?hook.parent,
            current_test = ?hook.current_test,
            start = ?hook.start,
            end = ?hook.end,
            duration = ?hook.duration,
            "Skipping hook"
        );
    }

    for test in suite.tests.values() {
        let case = build_test_case(suite_name, test, &test_suite.uuid, clock);
        result_set.route(&mut test_suite, case);
    }

    test_suite.refresh_flags();
    test_suite
}

fn build_test_case(
    suite_name: &str,
    test: &Test,
    parent_uuid: &str,
    clock: &mut IdClock,
) -> TestCase {
    let state = TestState::normalize(&test.state);
    // No separator between suite and test title; renderers match on this form
    let full_title = format!("{}{}", suite_name, test.title);
    let error = test.error.clone().unwrap_or_default();

    TestCase {
        title: test.title.clone(),
        uuid: clock.test_uuid(&full_title),
        full_title,
        timed_out: false,
        duration: test.duration.unwrap_or(0),
        pass: state == TestState::Pass,
        fail: state == TestState::Failed,
        pending: state == TestState::Pending,
        state,
        speed: DEFAULT_SPEED.to_string(),
        code: test.output.as_ref().map(|output| output.to_string()),
        err: serde_json::Map::new(),
        is_root: false,
        parent_uuid: parent_uuid.to_string(),
        skipped: false,
        error_type: error.error_type.filter(|s| !s.is_empty()),
        error: error.message.filter(|s| !s.is_empty()),
        standard_error: error.stack.filter(|s| !s.is_empty()),
    }
}

fn finalize_stats(result_set: &mut ResultSet) {
    let tests = result_set.all_tests.len() as u64;
    let passes = result_set.all_passes.len() as u64;
    let pending = result_set.all_pending.len() as u64;

    let stats = &mut result_set.stats;
    stats.suites = result_set.suites.suites.len() as u64;
    stats.tests = tests;
    stats.passes = passes;
    stats.pending = pending;
    stats.failures = result_set.all_failures.len() as u64;
    stats.pass_percent = percent(passes, tests);
    stats.pending_percent = percent(pending, tests);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::Bucket;
    use serde_json::{Value, json};

    fn runner(value: Value) -> RunnerInfo {
        RunnerInfo::decode("0-0", value).unwrap()
    }

    fn build(value: Value) -> ResultSet {
        let mut clock = IdClock::new();
        build_result_set("0-0", &runner(value), &RunTimings::default(), &mut clock).unwrap()
    }

    fn spec_with_suites(suites: Value) -> Value {
        json!({
            "sanitizedCapabilities": "chrome",
            "specs": {
                "spec-1": {
                    "files": ["/specs/login.js", "/specs/extra.js"],
                    "specHash": "abc123",
                    "suites": suites
                }
            }
        })
    }

    fn login_run() -> Value {
        spec_with_suites(json!({
            "wrapper": { "tests": {}, "hooks": {}, "_duration": 40 },
            "Login": {
                "tests": {
                    "works": { "title": "works", "state": "pass" },
                    "rejects bad password": {
                        "title": "rejects bad password",
                        "state": "fail",
                        "error": {
                            "type": "AssertionError",
                            "message": "expected 200 to equal 401",
                            "stack": "AssertionError: expected 200 to equal 401\n    at login.js:12"
                        }
                    }
                },
                "hooks": {},
                "_duration": 25
            }
        }))
    }

    #[test]
    fn test_single_suite_pass_and_fail() {
        let doc = build(login_run());

        assert_eq!(doc.stats.tests, 2);
        assert_eq!(doc.stats.passes, 1);
        assert_eq!(doc.stats.failures, 1);
        assert_eq!(doc.stats.pass_percent, 50.0);
        assert_eq!(doc.stats.pending_percent, 0.0);
        assert_eq!(doc.suites.suites.len(), 1);

        let login = &doc.suites.suites[0];
        assert_eq!(login.title, "Login");
        assert_eq!(login.total_passes, 1);
        assert_eq!(login.total_failures, 1);
        assert_eq!(login.file, "/specs/login.js");
        assert_eq!(login.full_file, "/specs/login.js");
        assert_eq!(login.uuid, "abc123");
        assert_eq!(login.duration, 25);
    }

    #[test]
    fn test_synthetic_root_is_blank() {
        let doc = build(login_run());

        let root = &doc.suites;
        assert!(root.root);
        assert!(root.title.is_empty());
        assert!(root.file.is_empty());
        assert!(root.uuid.is_empty());
        assert!(root.tests.is_empty());
        assert!(root.has_suites);
        assert_eq!(root.duration, 40);
        assert!(root.suites.iter().all(|s| !s.root));
        assert_eq!(doc.stats.suites, 1);
    }

    #[test]
    fn test_failure_details_copied() {
        let doc = build(login_run());

        let failure = &doc.all_failures[0];
        assert_eq!(failure.state, TestState::Failed);
        assert!(failure.fail && !failure.pass && !failure.pending);
        assert_eq!(failure.full_title, "Loginrejects bad password");
        assert_eq!(failure.error_type.as_deref(), Some("AssertionError"));
        assert_eq!(failure.error.as_deref(), Some("expected 200 to equal 401"));
        assert!(failure.standard_error.as_deref().unwrap().contains("login.js:12"));
        assert_eq!(failure.parent_uuid, "abc123");
        assert!(failure.uuid.ends_with("-Loginrejects bad password"));

        let pass = &doc.all_passes[0];
        assert!(pass.error_type.is_none() && pass.error.is_none());
    }

    #[test]
    fn test_suite_with_zero_tests() {
        let doc = build(spec_with_suites(json!({
            "wrapper": {},
            "Empty": { "tests": {}, "hooks": {}, "_duration": 0 }
        })));

        let empty = &doc.suites.suites[0];
        assert!(!empty.has_tests);
        assert_eq!(empty.total_tests, 0);
        assert!(doc.all_tests.is_empty());
    }

    #[test]
    fn test_zero_tests_percentages_are_zero() {
        let doc = build(spec_with_suites(json!({ "wrapper": {} })));

        assert_eq!(doc.stats.tests, 0);
        assert_eq!(doc.stats.pass_percent, 0.0);
        assert_eq!(doc.stats.pending_percent, 0.0);
        assert_eq!(doc.stats.suites, 0);
        assert!(!doc.suites.has_suites);
    }

    #[test]
    fn test_unrecognized_state_is_unbucketed() {
        let doc = build(spec_with_suites(json!({
            "wrapper": {},
            "Odd": {
                "tests": {
                    "a": { "title": "a", "state": "unknown" },
                    "b": { "title": "b", "state": "pending" }
                }
            }
        })));

        assert_eq!(doc.all_tests.len(), 2);
        assert!(doc.all_passes.is_empty());
        assert!(doc.all_failures.is_empty());
        assert_eq!(doc.all_pending.len(), 1);

        let odd = &doc.all_tests[0];
        assert_eq!(odd.state, TestState::Other("unknown".to_string()));
        assert!(!odd.pass && !odd.fail && !odd.pending);

        let suite = &doc.suites.suites[0];
        assert_eq!(suite.total_passes + suite.total_failures + suite.total_pending, 1);
        assert_eq!(suite.total_tests, 2);
        assert_eq!(doc.stats.pending_percent, 50.0);
    }

    #[test]
    fn test_wrapper_tests_are_dropped() {
        let doc = build(spec_with_suites(json!({
            "wrapper": { "tests": { "stray": { "title": "stray", "state": "pass" } } },
            "Real": { "tests": { "kept": { "title": "kept", "state": "pass" } } }
        })));

        assert_eq!(doc.stats.tests, 1);
        assert_eq!(doc.all_tests[0].title, "kept");
    }

    #[test]
    fn test_every_spec_contributes_children_in_order() {
        let doc = build(json!({
            "specs": {
                "first": {
                    "files": ["/a.js"],
                    "specHash": "ha",
                    "suites": {
                        "wrap-a": {},
                        "A1": { "tests": { "x": { "title": "x", "state": "pass" } } },
                        "A2": { "tests": { "y": { "title": "y", "state": "pending" } } }
                    }
                },
                "second": {
                    "files": ["/b.js"],
                    "specHash": "hb",
                    "suites": {
                        "wrap-b": {},
                        "B1": { "tests": { "z": { "title": "z", "state": "fail" } } }
                    }
                }
            }
        }));

        let titles: Vec<_> = doc.suites.suites.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["A1", "A2", "B1"]);
        assert_eq!(doc.suites.suites[2].file, "/b.js");

        let order: Vec<_> = doc.all_tests.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, ["x", "y", "z"]);
        assert_eq!(doc.state.passed, 1);
        assert_eq!(doc.state.skipped, 1);
        assert_eq!(doc.state.failed, 1);
    }

    #[test]
    fn test_flat_lists_partition_all_tests() {
        let doc = build(spec_with_suites(json!({
            "wrapper": {},
            "Mixed": {
                "tests": {
                    "1": { "title": "1", "state": "pass" },
                    "2": { "title": "2", "state": "fail" },
                    "3": { "title": "3", "state": "pending" },
                    "4": { "title": "4", "state": "skipped" },
                    "5": { "title": "5", "state": "pass" }
                }
            }
        })));

        let bucketed = doc.all_passes.len() + doc.all_pending.len() + doc.all_failures.len();
        let unbucketed = doc
            .all_tests
            .iter()
            .filter(|t| t.state.bucket().is_none())
            .count();
        assert_eq!(doc.stats.tests as usize, doc.all_tests.len());
        assert_eq!(bucketed + unbucketed, doc.all_tests.len());

        for case in &doc.all_tests {
            let flags = [case.pass, case.fail, case.pending];
            match case.state.bucket() {
                Some(Bucket::Pass) => assert_eq!(flags, [true, false, false]),
                Some(Bucket::Failed) => assert_eq!(flags, [false, true, false]),
                Some(Bucket::Pending) => assert_eq!(flags, [false, false, true]),
                None => assert_eq!(flags, [false, false, false]),
            }
        }
    }

    #[test]
    fn test_rebuild_yields_same_shape() {
        let info = runner(login_run());
        let mut clock = IdClock::new();
        let timings = RunTimings::default();
        let first = build_result_set("0-0", &info, &timings, &mut clock).unwrap();
        let second = build_result_set("0-0", &info, &timings, &mut clock).unwrap();

        assert_eq!(first.stats, second.stats);
        assert_eq!(first.state, second.state);
        let shape = |doc: &ResultSet| -> Vec<(String, usize)> {
            doc.suites
                .suites
                .iter()
                .map(|s| (s.title.clone(), s.tests.len()))
                .collect()
        };
        assert_eq!(shape(&first), shape(&second));
    }

    #[test]
    fn test_output_serialized_into_code() {
        let doc = build(spec_with_suites(json!({
            "wrapper": {},
            "Logs": {
                "tests": {
                    "t": { "title": "t", "state": "pass", "output": [{ "type": "log", "value": "hi" }] }
                }
            }
        })));

        let code = doc.all_tests[0].code.as_deref().unwrap();
        let parsed: Value = serde_json::from_str(code).unwrap();
        assert_eq!(parsed[0]["value"], "hi");
    }

    #[test]
    fn test_run_timings_copied() {
        let info = runner(login_run());
        let timings = RunTimings {
            start: Some("2018-05-01T10:00:00Z".parse().unwrap()),
            end: Some("2018-05-01T10:00:05Z".parse().unwrap()),
            duration: 5000,
            tests_registered: 9,
        };
        let doc = build_result_set("0-0", &info, &timings, &mut IdClock::new()).unwrap();

        assert_eq!(doc.stats.duration, 5000);
        assert_eq!(doc.stats.tests_registered, 9);
        assert_eq!(doc.stats.tests, 2);
        assert_eq!(doc.stats.start, timings.start);
    }

    #[test]
    fn test_spec_without_files_is_structural() {
        let info = runner(json!({
            "specs": { "s": { "files": [], "specHash": "h", "suites": {} } }
        }));
        let err =
            build_result_set("0-4", &info, &RunTimings::default(), &mut IdClock::new()).unwrap_err();
        assert!(err.to_string().contains("0-4"));
    }
}
