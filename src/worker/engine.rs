//! Search entry point.

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, SearchConfig};
use crate::matcher::{Candidate, DigestVerifier, Verifier};

use super::WorkerPool;

/// Terminal outcome of one search run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// A candidate hashes to the target digest
    Found(Candidate),
    /// Every candidate was evaluated and none matched
    Exhausted,
    /// The run was stopped from outside before it could finish
    Interrupted,
}

impl MatchResult {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, MatchResult::Found(_))
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            MatchResult::Found(candidate) => Some(candidate),
            _ => None,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Found(candidate) => write!(f, "found {}", candidate),
            MatchResult::Exhausted => write!(f, "exhausted"),
            MatchResult::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigError),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Runs partitioned brute-force searches.
///
/// Each call to [`SearchEngine::start`] or [`SearchEngine::search`] is an
/// independent run with its own workers, queue and stop signal.
#[derive(Clone, Default)]
pub struct SearchEngine {
    verifier: Option<Arc<dyn Verifier>>,
}

impl SearchEngine {
    /// Creates an engine that checks candidates against each configuration's target digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that uses `verifier` instead of the configuration's digest.
    pub fn with_verifier(verifier: Arc<dyn Verifier>) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    /// Starts a run and returns the pool driving it.
    pub fn start(
        &self,
        config: Arc<SearchConfig>,
        worker_count: usize,
    ) -> Result<WorkerPool, SearchError> {
        if config.prefixes().is_empty() {
            return Err(ConfigError::EmptyPrefixes.into());
        }
        let verifier: Arc<dyn Verifier> = match &self.verifier {
            Some(verifier) => verifier.clone(),
            None => Arc::new(DigestVerifier::new(*config.target())),
        };
        WorkerPool::new(config, verifier, worker_count)
    }

    /// Runs a search to completion.
    pub fn search(
        &self,
        config: Arc<SearchConfig>,
        worker_count: usize,
    ) -> Result<MatchResult, SearchError> {
        Ok(self.start(config, worker_count)?.wait_for_outcome())
    }
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("custom_verifier", &self.verifier.is_some())
            .finish()
    }
}
