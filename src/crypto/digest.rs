//! Candidate digest representation and computation.

use std::fmt;
use std::str::FromStr;

use blake2::{Blake2s256, Digest as _};

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a digest rendered as hex.
pub const DIGEST_HEX_LEN: usize = DIGEST_LEN * 2;

/// A BLAKE2s-256 digest (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Creates a digest from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Hashes `data` with BLAKE2s-256.
    #[inline]
    pub fn compute(data: &[u8]) -> Self {
        let hash = Blake2s256::digest(data);
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&hash);
        Self(out)
    }

    /// Returns the digest as raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Returns the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Error returned when a hex digest cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestParseError {
    #[error("digest must be {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("digest is not valid hex: {0}")]
    Hex(String),
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != DIGEST_HEX_LEN {
            return Err(DigestParseError::Length {
                expected: DIGEST_HEX_LEN,
                actual: s.len(),
            });
        }

        let mut out = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut out).map_err(|e| DigestParseError::Hex(e.to_string()))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
