//! Candidate construction and verification.
//!
//! - `Candidate`: a card number assembled from prefix, middle and suffix
//! - `Verifier`: the per-candidate match predicate used by workers

mod candidate;
mod verifier;

pub use candidate::Candidate;
pub use verifier::{DigestVerifier, Verifier};
