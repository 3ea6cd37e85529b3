//! Search latency as a function of worker count.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use crate::config::SearchConfig;
use crate::storage::PersistenceError;
use crate::worker::{MatchResult, SearchEngine, SearchError};

/// One timed search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsRecord {
    pub worker_count: usize,
    pub elapsed_seconds: f64,
}

impl StatisticsRecord {
    pub fn new(worker_count: usize, elapsed_seconds: f64) -> Self {
        Self {
            worker_count,
            elapsed_seconds,
        }
    }
}

/// Destination for benchmark records, written one at a time as runs finish.
pub trait StatisticsSink {
    fn append(&mut self, record: &StatisticsRecord) -> Result<(), PersistenceError>;
}

impl StatisticsSink for Vec<StatisticsRecord> {
    fn append(&mut self, record: &StatisticsRecord) -> Result<(), PersistenceError> {
        self.push(*record);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BenchmarkError {
    #[error("Benchmark run with {worker_count} worker(s) failed: {source}")]
    Search {
        worker_count: usize,
        #[source]
        source: SearchError,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Default sweep: 1 up to (but excluding) 1.5x the CPU count.
pub fn default_sweep(cpus: usize) -> Vec<usize> {
    let upper = (cpus * 3 / 2).max(2);
    (1..upper).collect()
}

/// Runs the same search with each worker count in turn and records the timings.
#[derive(Debug, Default)]
pub struct ScalingBenchmark {
    engine: SearchEngine,
    running: Mutex<()>,
}

impl ScalingBenchmark {
    pub fn new(engine: SearchEngine) -> Self {
        Self {
            engine,
            running: Mutex::new(()),
        }
    }

    /// Times one search per entry of `worker_counts`.
    ///
    /// Runs never overlap, even across threads sharing this benchmark.
    /// Each record reaches `sink` before the next run starts, and the
    /// first failing run or write ends the sweep.
    pub fn run(
        &self,
        config: &Arc<SearchConfig>,
        worker_counts: &[usize],
        sink: &mut dyn StatisticsSink,
    ) -> Result<Vec<StatisticsRecord>, BenchmarkError> {
        self.run_with_progress(config, worker_counts, sink, |_, _| {})
    }

    /// Like [`ScalingBenchmark::run`], calling `on_run` after each recorded run.
    pub fn run_with_progress(
        &self,
        config: &Arc<SearchConfig>,
        worker_counts: &[usize],
        sink: &mut dyn StatisticsSink,
        mut on_run: impl FnMut(&StatisticsRecord, &MatchResult),
    ) -> Result<Vec<StatisticsRecord>, BenchmarkError> {
        let _guard = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut records = Vec::with_capacity(worker_counts.len());
        for &worker_count in worker_counts {
            let started = Instant::now();
            let outcome = self
                .engine
                .search(config.clone(), worker_count)
                .map_err(|source| BenchmarkError::Search {
                    worker_count,
                    source,
                })?;
            let record = StatisticsRecord::new(worker_count, started.elapsed().as_secs_f64());

            sink.append(&record)?;
            on_run(&record, &outcome);
            records.push(record);
        }
        Ok(records)
    }
}
