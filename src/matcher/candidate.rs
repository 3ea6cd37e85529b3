//! Candidate card number assembly.

use std::fmt;

/// A fully assembled card number: `prefix ++ zero_pad(middle) ++ suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate(String);

impl Candidate {
    /// Builds a candidate, zero-padding `middle` to `width` digits.
    ///
    /// `middle` is expected to fit in `width` digits; the work queue only
    /// hands out values below `10^width`.
    #[inline]
    pub fn build(prefix: &str, middle: u64, width: u32, suffix: &str) -> Self {
        let mut number = String::with_capacity(prefix.len() + width as usize + suffix.len());
        number.push_str(prefix);
        number.push_str(&format!("{:0width$}", middle, width = width as usize));
        number.push_str(suffix);
        Self(number)
    }

    /// Returns the card number.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the card number bytes fed to the digest.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
