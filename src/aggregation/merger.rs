//! Folds per-worker result documents into one master document

use tracing::debug;

use crate::config::PERCENT_INCREMENT_PER_DOCUMENT;
use crate::model::{MasterResultSet, ResultSet};

/// Accumulates per-worker documents into a [`MasterResultSet`].
///
/// Documents are only read. Counters are summed, top-level suites are
/// appended in document order and every `all*` list is kept as one nested
/// entry per document.
pub struct Merger {
    master: MasterResultSet,
    documents: usize,
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

impl Merger {
    pub fn new() -> Self {
        Self {
            master: MasterResultSet::empty(),
            documents: 0,
        }
    }

    pub fn fold(&mut self, document: &ResultSet) {
        let stats = &mut self.master.stats;
        stats.duration += document.stats.duration;
        stats.tests_registered += document.stats.tests_registered;
        stats.tests += document.stats.tests;
        stats.skipped += document.stats.skipped;
        stats.other += document.stats.other;
        stats.suites += document.stats.suites;
        stats.passes += document.stats.passes;
        stats.pending += document.stats.pending;
        stats.failures += document.stats.failures;
        // Fixed step per document, not a weighted recomputation
        stats.pass_percent += PERCENT_INCREMENT_PER_DOCUMENT;
        stats.pending_percent += PERCENT_INCREMENT_PER_DOCUMENT;
        stats.has_skipped = stats.skipped > 0;
        stats.has_other = stats.other > 0;

        stats.start = match (stats.start, document.stats.start) {
            (Some(current), Some(next)) => Some(current.min(next)),
            (current, next) => current.or(next),
        };
        stats.end = match (stats.end, document.stats.end) {
            (Some(current), Some(next)) => Some(current.max(next)),
            (current, next) => current.or(next),
        };

        let state = &mut self.master.state;
        state.passed += document.state.passed;
        state.failed += document.state.failed;
        state.skipped += document.state.skipped;

        self.master
            .suites
            .suites
            .extend(document.suites.suites.iter().cloned());

        self.master.all_tests.push(document.all_tests.clone());
        self.master.all_passes.push(document.all_passes.clone());
        self.master.all_pending.push(document.all_pending.clone());
        self.master.all_failures.push(document.all_failures.clone());

        self.documents += 1;
    }

    pub fn finish(mut self) -> MasterResultSet {
        self.master.suites.refresh_flags();
        debug!(
            "Merged {} documents: {} suites, {} tests",
            self.documents, self.master.stats.suites, self.master.stats.tests
        );
        self.master
    }
}

/// Merge documents in the order given.
pub fn merge_documents<'a>(documents: impl IntoIterator<Item = &'a ResultSet>) -> MasterResultSet {
    let mut merger = Merger::new();
    for document in documents {
        merger.fold(document);
    }
    merger.finish()
}
