//! Parallel search over the card number space.
//!
//! This module provides:
//! - A shared work queue handing out middle values one at a time
//! - Multi-threaded CPU workers with cooperative cancellation
//! - A pool that reports matches in completion order
//! - The `SearchEngine` entry point used by the CLI and the benchmark

mod cancel;
mod cpu;
mod engine;
mod pool;

pub use cancel::CancellationToken;
pub use cpu::{CpuWorker, SearchStats, WorkQueue};
pub use engine::{MatchResult, SearchEngine, SearchError};
pub use pool::{PoolEvent, SearchHit, WorkerPool};
