//! # card_finder
//!
//! Recovers a card number from its BLAKE2s-256 digest when the number's
//! prefix (one of a known set), width and suffix are known, by searching
//! the unknown middle digits in parallel.
//!
//! ## Architecture
//!
//! - `crypto`: Digest type and computation
//! - `matcher`: Candidate assembly and verification
//! - `worker`: Work queue, worker pool, search engine
//! - `luhn`: Checksum validation
//! - `bench`: Worker-count scaling benchmark
//! - `storage`: Statistics table and result records
//! - `chart`: SVG rendering of benchmark results
//! - `config`, `cli`: Settings file and command line

pub mod bench;
pub mod chart;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod luhn;
pub mod matcher;
pub mod storage;
pub mod worker;

pub use bench::{ScalingBenchmark, StatisticsRecord, StatisticsSink};
pub use config::{ConfigError, SearchConfig, Settings};
pub use crypto::{digest_hex, Digest};
pub use matcher::{Candidate, DigestVerifier, Verifier};
pub use storage::{CardRecord, PersistenceError, ScalingReport, StatisticsTable};
pub use worker::{MatchResult, SearchEngine, SearchError, WorkerPool};
