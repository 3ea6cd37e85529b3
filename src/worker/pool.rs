//! Worker pool management for one search run.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};

use crate::config::{ConfigError, SearchConfig};
use crate::matcher::{Candidate, Verifier};

use super::cpu::{CpuWorker, SearchStats, WorkQueue};
use super::{CancellationToken, MatchResult, SearchError};

/// A match reported by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// The matching card number
    pub candidate: Candidate,
    /// The middle value that produced it
    pub middle: u64,
    /// The ID of the worker that found it
    pub worker_id: usize,
}

/// What a wait on the pool observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// A worker reported a match
    Hit(SearchHit),
    /// Nothing happened before the timeout
    Pending,
    /// Every worker has exited without reporting a match
    Finished,
}

/// A running search: worker threads, their result channel and shared counters.
///
/// Results are received in the order workers produce them, whichever item
/// they came from.
pub struct WorkerPool {
    num_workers: usize,
    config: Arc<SearchConfig>,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<SearchHit>,
    stop: CancellationToken,
    stats: Arc<SearchStats>,
    start_time: Instant,
}

impl WorkerPool {
    /// Spawns `num_workers` threads searching `config`.
    pub fn new(
        config: Arc<SearchConfig>,
        verifier: Arc<dyn Verifier>,
        num_workers: usize,
    ) -> Result<Self, SearchError> {
        if num_workers == 0 {
            return Err(ConfigError::InvalidWorkerCount(num_workers).into());
        }

        // Each worker sends at most one hit, so sends never block.
        let (result_tx, result_rx) = bounded(num_workers);
        let stop = CancellationToken::new();
        let stats = Arc::new(SearchStats::new());
        let queue = Arc::new(WorkQueue::new(config.middle_space()));
        let start_time = Instant::now();

        let mut handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let worker = CpuWorker::new(
                id,
                config.clone(),
                verifier.clone(),
                queue.clone(),
                result_tx.clone(),
                stop.clone(),
                stats.clone(),
            );

            let spawned = thread::Builder::new()
                .name(format!("card-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    stop.cancel();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(SearchError::Spawn(e));
                }
            }
        }

        // The channel disconnects once every worker has exited.
        drop(result_tx);

        Ok(Self {
            num_workers,
            config,
            handles: Some(handles),
            result_rx,
            stop,
            stats,
            start_time,
        })
    }

    /// Waits up to `timeout` for the next worker event.
    pub fn wait_for_event(&self, timeout: Duration) -> PoolEvent {
        match self.result_rx.recv_timeout(timeout) {
            Ok(hit) => PoolEvent::Hit(hit),
            Err(RecvTimeoutError::Timeout) => PoolEvent::Pending,
            Err(RecvTimeoutError::Disconnected) => PoolEvent::Finished,
        }
    }

    /// Blocks until the run reaches a terminal state, then stops and joins the workers.
    ///
    /// The first hit observed wins and cancels everything still in flight.
    pub fn wait_for_outcome(self) -> MatchResult {
        let outcome = match self.result_rx.recv() {
            Ok(hit) => MatchResult::Found(hit.candidate),
            Err(_) => self.finished_outcome(),
        };
        self.join();
        outcome
    }

    /// Classifies a run whose workers have all exited without a hit.
    ///
    /// `Exhausted` requires every work item to have been evaluated;
    /// anything less means the run was stopped from outside.
    pub fn finished_outcome(&self) -> MatchResult {
        if self.stats.total_items() >= self.config.middle_space() {
            MatchResult::Exhausted
        } else {
            MatchResult::Interrupted
        }
    }

    /// Signals all workers to stop before their next item.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Stops the workers and waits for them to exit.
    pub fn join(mut self) {
        self.stop();
        self.join_handles();
    }

    fn join_handles(&mut self) {
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Returns the shared counters of this run.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn total_candidates(&self) -> u64 {
        self.stats.total_candidates()
    }

    pub fn total_faults(&self) -> u64 {
        self.stats.total_faults()
    }

    /// Fraction of work items evaluated so far, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let done = self.stats.total_items().min(self.config.middle_space());
        done as f64 / self.config.middle_space() as f64
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the current rate (candidates per second).
    pub fn candidates_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_candidates() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Returns a handle to the stop signal for external use (e.g., signal handlers).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        self.join_handles();
    }
}
