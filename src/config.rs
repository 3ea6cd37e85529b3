//! Search configuration and the settings file it is built from.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::bench::default_sweep;
use crate::crypto::{Digest, DigestParseError};

/// Width of the unknown middle segment of a card number.
pub const DEFAULT_MIDDLE_WIDTH: u32 = 6;

/// Widest middle segment supported (the space must fit comfortably in `u64`).
pub const MAX_MIDDLE_WIDTH: u32 = 9;

/// Immutable description of one search space.
///
/// Shared read-only by every worker of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    target: Digest,
    prefixes: Vec<String>,
    middle_width: u32,
    suffix: String,
}

impl SearchConfig {
    /// Creates a configuration from a hex target digest.
    pub fn new(
        target_digest: &str,
        prefixes: Vec<String>,
        suffix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let target = target_digest.parse::<Digest>()?;
        Self::with_target(target, prefixes, suffix)
    }

    /// Creates a configuration from an already parsed target digest.
    pub fn with_target(
        target: Digest,
        prefixes: Vec<String>,
        suffix: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let suffix = suffix.into();
        validate_prefixes(&prefixes)?;
        if !is_digits(&suffix) {
            return Err(ConfigError::NonDigit {
                field: "suffix",
                value: suffix,
            });
        }

        Ok(Self {
            target,
            prefixes,
            middle_width: DEFAULT_MIDDLE_WIDTH,
            suffix,
        })
    }

    /// Overrides the width of the middle segment.
    pub fn with_middle_width(mut self, width: u32) -> Result<Self, ConfigError> {
        if !(1..=MAX_MIDDLE_WIDTH).contains(&width) {
            return Err(ConfigError::InvalidMiddleWidth(width));
        }
        self.middle_width = width;
        Ok(self)
    }

    pub fn target(&self) -> &Digest {
        &self.target
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn middle_width(&self) -> u32 {
        self.middle_width
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Number of work items: every middle value in `[0, 10^width)`.
    pub fn middle_space(&self) -> u64 {
        10u64.pow(self.middle_width)
    }

    /// Number of candidates in the whole space.
    pub fn total_candidates(&self) -> u64 {
        self.middle_space() * self.prefixes.len() as u64
    }

    /// Length of every candidate produced from this configuration.
    pub fn candidate_len(&self) -> usize {
        self.prefixes[0].len() + self.middle_width as usize + self.suffix.len()
    }
}

fn validate_prefixes(prefixes: &[String]) -> Result<(), ConfigError> {
    let first = prefixes.first().ok_or(ConfigError::EmptyPrefixes)?;

    let mut seen = HashSet::with_capacity(prefixes.len());
    for prefix in prefixes {
        if prefix.is_empty() || !is_digits(prefix) {
            return Err(ConfigError::NonDigit {
                field: "prefix",
                value: prefix.clone(),
            });
        }
        if prefix.len() != first.len() {
            return Err(ConfigError::UnequalPrefixLengths {
                expected: first.len(),
                prefix: prefix.clone(),
            });
        }
        if !seen.insert(prefix.as_str()) {
            return Err(ConfigError::DuplicatePrefix(prefix.clone()));
        }
    }
    Ok(())
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Settings record read from the JSON settings file.
///
/// Key names of older settings files (`hash`, `bin`, `last_number`,
/// `card_number`, `csv_statistics`, `png_statistics`) are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Hex BLAKE2s-256 digest of the card number
    #[serde(alias = "hash")]
    pub target_digest: String,

    /// Admissible card prefixes (BINs), tried in this order
    #[serde(alias = "bin", deserialize_with = "digit_strings")]
    pub prefixes: Vec<String>,

    /// Known trailing digits
    #[serde(alias = "last_number", deserialize_with = "digit_string")]
    pub suffix: String,

    /// Worker threads for a search (default: number of CPU cores)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_count_for_search: Option<usize>,

    /// Worker counts for the statistics sweep (default: 1 up to 1.5x CPU cores)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark_worker_counts: Option<Vec<usize>>,

    #[serde(alias = "csv_statistics")]
    pub statistics_table_path: PathBuf,

    #[serde(alias = "png_statistics")]
    pub statistics_chart_path: PathBuf,

    #[serde(alias = "card_number")]
    pub result_output_path: PathBuf,
}

impl Settings {
    /// Reads and validates a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings without building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search_config()?;
        if self.worker_count_for_search == Some(0) {
            return Err(ConfigError::InvalidWorkerCount(0));
        }
        if let Some(counts) = &self.benchmark_worker_counts {
            if let Some(&bad) = counts.iter().find(|&&w| w == 0) {
                return Err(ConfigError::InvalidWorkerCount(bad));
            }
        }
        Ok(())
    }

    /// Builds the search configuration described by these settings.
    pub fn search_config(&self) -> Result<SearchConfig, ConfigError> {
        SearchConfig::new(&self.target_digest, self.prefixes.clone(), self.suffix.clone())
    }

    /// Returns the number of search workers, defaulting to `cpus`.
    pub fn worker_count(&self, cpus: usize) -> usize {
        self.worker_count_for_search.unwrap_or(cpus)
    }

    /// Returns where the SVG chart is written.
    ///
    /// The chart is always SVG, so a legacy `.png` path gets its extension replaced.
    pub fn chart_path(&self) -> PathBuf {
        self.statistics_chart_path.with_extension("svg")
    }

    /// Returns the worker counts swept by the statistics run.
    pub fn benchmark_worker_counts(&self, cpus: usize) -> Vec<usize> {
        self.benchmark_worker_counts
            .clone()
            .unwrap_or_else(|| default_sweep(cpus))
    }
}

/// A digit string that older settings files may store as a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum DigitField {
    Text(String),
    Number(u64),
}

impl From<DigitField> for String {
    fn from(field: DigitField) -> Self {
        match field {
            DigitField::Text(s) => s,
            DigitField::Number(n) => n.to_string(),
        }
    }
}

pub(crate) fn digit_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    DigitField::deserialize(deserializer).map(String::from)
}

fn digit_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let fields = Vec::<DigitField>::deserialize(deserializer)?;
    Ok(fields.into_iter().map(String::from).collect())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: prefix set is empty")]
    EmptyPrefixes,

    #[error("Invalid configuration: prefix {prefix} does not have length {expected}")]
    UnequalPrefixLengths { expected: usize, prefix: String },

    #[error("Invalid configuration: duplicate prefix {0}")]
    DuplicatePrefix(String),

    #[error("Invalid configuration: {field} '{value}' must contain only decimal digits")]
    NonDigit { field: &'static str, value: String },

    #[error("Invalid configuration: worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Invalid configuration: middle width must be between 1 and {max}, got {0}", max = MAX_MIDDLE_WIDTH)]
    InvalidMiddleWidth(u32),

    #[error("Invalid configuration: target {0}")]
    InvalidDigest(#[from] DigestParseError),

    #[error("Cannot read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::digest_hex;

    fn target() -> String {
        digest_hex("4111112222220000")
    }

    #[test]
    fn test_valid_config() {
        let config = SearchConfig::new(&target(), vec!["411111".into()], "0000").unwrap();
        assert_eq!(config.middle_width(), DEFAULT_MIDDLE_WIDTH);
        assert_eq!(config.middle_space(), 1_000_000);
        assert_eq!(config.total_candidates(), 1_000_000);
        assert_eq!(config.candidate_len(), 16);
    }

    #[test]
    fn test_empty_prefixes() {
        let err = SearchConfig::new(&target(), vec![], "0000").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPrefixes));
    }

    #[test]
    fn test_unequal_prefixes() {
        let err =
            SearchConfig::new(&target(), vec!["411111".into(), "5555".into()], "0000").unwrap_err();
        assert!(matches!(err, ConfigError::UnequalPrefixLengths { expected: 6, .. }));
    }

    #[test]
    fn test_duplicate_prefixes() {
        let err = SearchConfig::new(&target(), vec!["411111".into(), "411111".into()], "")
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePrefix(_)));
    }

    #[test]
    fn test_non_digit_suffix() {
        let err = SearchConfig::new(&target(), vec!["411111".into()], "00a0").unwrap_err();
        assert!(matches!(err, ConfigError::NonDigit { field: "suffix", .. }));
    }

    #[test]
    fn test_malformed_digest() {
        let err = SearchConfig::new("abc", vec!["411111".into()], "0000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDigest(_)));
    }

    #[test]
    fn test_middle_width_bounds() {
        let config = SearchConfig::new(&target(), vec!["411111".into()], "0000").unwrap();
        assert!(config.clone().with_middle_width(0).is_err());
        assert!(config.clone().with_middle_width(10).is_err());
        assert_eq!(config.with_middle_width(3).unwrap().middle_space(), 1000);
    }

    #[test]
    fn test_settings_parse() {
        let json = format!(
            r#"{{
                "target_digest": "{}",
                "prefixes": ["411111", "555555"],
                "suffix": "0000",
                "worker_count_for_search": 4,
                "statistics_table_path": "stats.csv",
                "statistics_chart_path": "stats.svg",
                "result_output_path": "card.json"
            }}"#,
            target()
        );
        let settings: Settings = serde_json::from_str(&json).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.worker_count(16), 4);
        assert_eq!(settings.search_config().unwrap().prefixes().len(), 2);
    }

    #[test]
    fn test_settings_legacy_keys() {
        let json = format!(
            r#"{{
                "hash": "{}",
                "bin": [411111, "555555"],
                "last_number": 1234,
                "card_number": "card.json",
                "csv_statistics": "stats.csv",
                "png_statistics": "stats.png"
            }}"#,
            target()
        );
        let settings: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings.prefixes, vec!["411111", "555555"]);
        assert_eq!(settings.suffix, "1234");
        assert_eq!(settings.result_output_path, PathBuf::from("card.json"));
        assert_eq!(settings.chart_path(), PathBuf::from("stats.svg"));
        assert_eq!(settings.worker_count(8), 8);
        assert_eq!(settings.benchmark_worker_counts(2), vec![1, 2]);
    }

    #[test]
    fn test_settings_rejects_zero_workers() {
        let settings = Settings {
            target_digest: target(),
            prefixes: vec!["411111".into()],
            suffix: "0000".into(),
            worker_count_for_search: Some(0),
            benchmark_worker_counts: None,
            statistics_table_path: "stats.csv".into(),
            statistics_chart_path: "stats.svg".into(),
            result_output_path: "card.json".into(),
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidWorkerCount(0))
        ));
    }

    #[test]
    fn test_settings_missing_file() {
        let err = Settings::load("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
