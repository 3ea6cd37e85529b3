//! Cryptographic primitives for candidate verification.
//!
//! The digest algorithm is BLAKE2s-256 for every run. Changing it would
//! invalidate every target digest produced so far.

mod digest;

pub use digest::{Digest, DigestParseError, DIGEST_HEX_LEN, DIGEST_LEN};

/// Hex-encoded BLAKE2s-256 digest of a candidate string.
pub fn digest_hex(candidate: &str) -> String {
    Digest::compute(candidate.as_bytes()).to_hex()
}
