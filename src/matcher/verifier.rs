//! Candidate verification against a target digest.

use crate::crypto::Digest;

use super::Candidate;

/// Decides whether a candidate is the number being searched for.
///
/// Implementations are shared by every worker of a run and must not
/// hold mutable state that requires locking.
pub trait Verifier: Send + Sync {
    fn matches(&self, candidate: &Candidate) -> bool;
}

/// Compares the BLAKE2s-256 digest of a candidate with a fixed target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestVerifier {
    target: Digest,
}

impl DigestVerifier {
    pub fn new(target: Digest) -> Self {
        Self { target }
    }

    /// Returns the target digest.
    pub fn target(&self) -> &Digest {
        &self.target
    }
}

impl Verifier for DigestVerifier {
    #[inline]
    fn matches(&self, candidate: &Candidate) -> bool {
        Digest::compute(candidate.as_bytes()) == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::digest_hex;

    #[test]
    fn test_matches_own_digest() {
        let candidate = Candidate::build("411111", 222222, 6, "0000");
        let target: Digest = digest_hex(candidate.as_str()).parse().unwrap();
        let verifier = DigestVerifier::new(target);
        assert!(verifier.matches(&candidate));
    }

    #[test]
    fn test_rejects_neighbour() {
        let candidate = Candidate::build("411111", 222222, 6, "0000");
        let verifier = DigestVerifier::new(Digest::compute(candidate.as_bytes()));
        let neighbour = Candidate::build("411111", 222223, 6, "0000");
        assert!(!verifier.matches(&neighbour));
    }
}
