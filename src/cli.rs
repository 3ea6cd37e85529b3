//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser};

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Card number recovery from a BLAKE2s digest
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON settings file with the digest, prefixes, suffix and output paths
    #[arg(short = 's', long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    #[command(flatten)]
    pub mode: Mode,

    /// Number of worker threads for --find (overrides the settings file)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

/// The operation to perform; exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Mode {
    /// Search for the card number matching the digest and save it
    #[arg(short = 'f', long)]
    pub find: bool,

    /// Time the search for every worker count and append to the statistics table
    #[arg(short = 'b', long)]
    pub statistics: bool,

    /// Check a card number with the Luhn algorithm (default: the saved result)
    #[arg(short = 'l', long, value_name = "NUMBER", num_args = 0..=1)]
    pub luhn: Option<Option<String>>,

    /// Render the statistics table as an SVG chart
    #[arg(short = 'v', long)]
    pub visualize: bool,
}

/// A resolved [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Find,
    Statistics,
    Luhn(Option<String>),
    Visualize,
}

impl Cli {
    /// Returns the selected operation.
    pub fn command(&self) -> Command {
        let mode = &self.mode;
        if mode.find {
            Command::Find
        } else if mode.statistics {
            Command::Statistics
        } else if let Some(number) = &mode.luhn {
            Command::Luhn(number.clone())
        } else {
            Command::Visualize
        }
    }
}
