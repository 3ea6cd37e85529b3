//! CPU worker that evaluates middle values pulled from a shared queue.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::config::SearchConfig;
use crate::matcher::{Candidate, Verifier};

use super::{CancellationToken, SearchHit};

/// Counters shared by all workers of a run.
#[derive(Debug, Default)]
pub struct SearchStats {
    /// Candidates hashed and compared
    pub candidates_tested: AtomicU64,
    /// Work items fully evaluated (including faulted ones)
    pub items_completed: AtomicU64,
    /// Work items abandoned because evaluation panicked
    pub items_faulted: AtomicU64,
    /// Matches reported
    pub matches_found: AtomicU64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_candidates(&self) -> u64 {
        self.candidates_tested.load(Ordering::Relaxed)
    }

    pub fn total_items(&self) -> u64 {
        self.items_completed.load(Ordering::Relaxed)
    }

    pub fn total_faults(&self) -> u64 {
        self.items_faulted.load(Ordering::Relaxed)
    }

    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Hands out middle values `0..len`, each exactly once.
#[derive(Debug)]
pub struct WorkQueue {
    next: AtomicU64,
    len: u64,
}

impl WorkQueue {
    pub fn new(len: u64) -> Self {
        Self {
            next: AtomicU64::new(0),
            len,
        }
    }

    /// Claims the next unassigned item, or `None` once the space is drained.
    #[inline]
    pub fn claim(&self) -> Option<u64> {
        let item = self.next.fetch_add(1, Ordering::Relaxed);
        (item < self.len).then_some(item)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A worker thread body.
pub struct CpuWorker {
    id: usize,
    config: Arc<SearchConfig>,
    verifier: Arc<dyn Verifier>,
    queue: Arc<WorkQueue>,
    result_tx: Sender<SearchHit>,
    stop: CancellationToken,
    stats: Arc<SearchStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        config: Arc<SearchConfig>,
        verifier: Arc<dyn Verifier>,
        queue: Arc<WorkQueue>,
        result_tx: Sender<SearchHit>,
        stop: CancellationToken,
        stats: Arc<SearchStats>,
    ) -> Self {
        Self {
            id,
            config,
            verifier,
            queue,
            result_tx,
            stop,
            stats,
        }
    }

    /// Runs the worker loop.
    ///
    /// Pulls items until one of:
    /// - the queue is drained
    /// - the stop token is cancelled (checked before every item)
    /// - this worker reports a match, which also cancels the stop token
    ///
    /// A panic while evaluating an item loses that item only; it is not retried.
    pub fn run(&self) {
        while !self.stop.is_cancelled() {
            let Some(middle) = self.queue.claim() else {
                break;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(middle)));
            self.stats.items_completed.fetch_add(1, Ordering::Relaxed);

            match outcome {
                Ok(Some(candidate)) => {
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    let hit = SearchHit {
                        candidate,
                        middle,
                        worker_id: self.id,
                    };
                    self.stop.cancel();
                    // Receiver gone means the run already ended.
                    let _ = self.result_tx.send(hit);
                    break;
                }
                Ok(None) => {}
                Err(_) => {
                    self.stats.items_faulted.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Tries every prefix, in configuration order, with one middle value.
    fn evaluate(&self, middle: u64) -> Option<Candidate> {
        let width = self.config.middle_width();
        let suffix = self.config.suffix();
        let mut tested = 0;

        let found = self.config.prefixes().iter().find_map(|prefix| {
            let candidate = Candidate::build(prefix, middle, width, suffix);
            tested += 1;
            self.verifier.matches(&candidate).then_some(candidate)
        });

        self.stats
            .candidates_tested
            .fetch_add(tested, Ordering::Relaxed);
        found
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    use crate::crypto::Digest;
    use crate::matcher::DigestVerifier;

    fn config(number: &str, prefixes: &[&str], width: u32) -> Arc<SearchConfig> {
        let prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        let suffix = &number[number.len() - 2..];
        Arc::new(
            SearchConfig::with_target(Digest::compute(number.as_bytes()), prefixes, suffix)
                .unwrap()
                .with_middle_width(width)
                .unwrap(),
        )
    }

    #[test]
    fn test_queue_hands_out_each_item_once() {
        let queue = WorkQueue::new(3);
        assert_eq!(queue.claim(), Some(0));
        assert_eq!(queue.claim(), Some(1));
        assert_eq!(queue.claim(), Some(2));
        assert_eq!(queue.claim(), None);
        assert_eq!(queue.claim(), None);
    }

    #[test]
    fn test_single_worker_finds_match() {
        let config = config("55017799", &["41", "55"], 4);
        let verifier = Arc::new(DigestVerifier::new(*config.target()));
        let queue = Arc::new(WorkQueue::new(config.middle_space()));
        let stats = Arc::new(SearchStats::new());
        let (tx, rx) = unbounded();

        let worker = CpuWorker::new(
            0,
            config,
            verifier,
            queue,
            tx,
            CancellationToken::new(),
            stats.clone(),
        );
        worker.run();

        let hit = rx.try_recv().unwrap();
        assert_eq!(hit.candidate.as_str(), "55017799");
        assert_eq!(hit.middle, 177);
        assert_eq!(stats.total_matches(), 1);
        // Items 0..=177, both prefixes each.
        assert_eq!(stats.total_items(), 178);
        assert_eq!(stats.total_candidates(), 178 * 2);
    }

    #[test]
    fn test_match_cancels_other_workers() {
        let config = config("55017799", &["55"], 4);
        let verifier = Arc::new(DigestVerifier::new(*config.target()));
        let queue = Arc::new(WorkQueue::new(config.middle_space()));
        let stats = Arc::new(SearchStats::new());
        let (tx, rx) = unbounded();
        let stop = CancellationToken::new();

        CpuWorker::new(
            0,
            config.clone(),
            verifier.clone(),
            queue.clone(),
            tx.clone(),
            stop.clone(),
            stats.clone(),
        )
        .run();
        assert!(stop.is_cancelled());
        assert!(rx.try_recv().is_ok());

        // A second worker sharing the token stops before claiming anything.
        CpuWorker::new(1, config, verifier, queue.clone(), tx, stop, stats.clone()).run();
        assert_eq!(stats.total_items(), 178);
        assert_eq!(queue.claim(), Some(178));
    }

    #[test]
    fn test_cancelled_worker_claims_nothing() {
        let config = config("55017799", &["55"], 4);
        let verifier = Arc::new(DigestVerifier::new(*config.target()));
        let queue = Arc::new(WorkQueue::new(config.middle_space()));
        let stats = Arc::new(SearchStats::new());
        let (tx, rx) = unbounded();
        let stop = CancellationToken::new();
        stop.cancel();

        CpuWorker::new(0, config, verifier, queue.clone(), tx, stop, stats.clone()).run();

        assert!(rx.try_recv().is_err());
        assert_eq!(stats.total_items(), 0);
        assert_eq!(queue.claim(), Some(0));
    }
}
