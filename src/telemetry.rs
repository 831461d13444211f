/// Progress events emitted by the coordinator while processing workers
#[derive(Debug, Clone)]
pub enum AggregationEvent {
    /// A worker's document was built in memory
    DocumentBuilt { tests: u64, build_micros: u64 },
    /// A worker's document was written to storage
    DocumentPersisted,
    /// A worker produced no document
    WorkerFailed,
}

/// Statistics aggregated from aggregation events
#[derive(Debug, Default, Clone)]
pub struct ProgressStats {
    pub workers_built: usize,
    pub documents_persisted: usize,
    pub workers_failed: usize,
    pub tests_seen: u64,
    pub build_durations_micros: Vec<u64>,
}

impl ProgressStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with an aggregation event
    pub fn update(&mut self, event: &AggregationEvent) {
        match event {
            AggregationEvent::DocumentBuilt {
                tests,
                build_micros,
            } => {
                self.workers_built += 1;
                self.tests_seen += tests;
                self.build_durations_micros.push(*build_micros);
            }
            AggregationEvent::DocumentPersisted => {
                self.documents_persisted += 1;
            }
            AggregationEvent::WorkerFailed => {
                self.workers_failed += 1;
            }
        }
    }

    /// Calculate percentile from per-worker build durations
    pub fn percentile(&self, p: f64) -> Option<u64> {
        if self.build_durations_micros.is_empty() {
            return None;
        }

        let mut sorted = self.build_durations_micros.clone();
        sorted.sort_unstable();

        let index = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
        let index = index.saturating_sub(1).min(sorted.len() - 1);

        Some(sorted[index])
    }
}
