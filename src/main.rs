//! Card number recovery CLI
//!
//! Usage:
//!   card_finder --find                 # Search for the card and save it
//!   card_finder --find -w 8            # Same, with 8 worker threads
//!   card_finder --statistics           # Time the search for 1..1.5x CPU workers
//!   card_finder --luhn                 # Check the saved card with the Luhn algorithm
//!   card_finder --luhn 4532015112830366
//!   card_finder --visualize            # Render the statistics table as SVG

use std::error::Error;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use card_finder::chart::write_chart;
use card_finder::cli::{Cli, Command};
use card_finder::luhn;
use card_finder::worker::{CancellationToken, PoolEvent};
use card_finder::{
    CardRecord, MatchResult, ScalingBenchmark, SearchEngine, Settings, StatisticsTable,
    WorkerPool,
};

/// The search space held no match.
const EXIT_NOT_FOUND: i32 = 2;
/// The search was stopped with Ctrl+C.
const EXIT_INTERRUPTED: i32 = 130;

type CliResult = Result<i32, Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();
    let cpus = num_cpus::get();

    let result = match cli.command() {
        Command::Find => load_settings(&cli).and_then(|s| find_card(&cli, &s, cpus)),
        Command::Statistics => load_settings(&cli).and_then(|s| run_statistics(&s, cpus)),
        Command::Luhn(Some(number)) => check_luhn(&number),
        Command::Luhn(None) => load_settings(&cli).and_then(|s| check_saved_card(&s)),
        Command::Visualize => load_settings(&cli).and_then(|s| visualize(&s)),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings, Box<dyn Error>> {
    Ok(Settings::load(&cli.settings)?)
}

fn find_card(cli: &Cli, settings: &Settings, cpus: usize) -> CliResult {
    let config = Arc::new(settings.search_config()?);
    let workers = cli.workers.unwrap_or_else(|| settings.worker_count(cpus));

    println!("Card Number Search");
    println!("==================");
    println!("Digest:     {}", config.target());
    println!("Prefixes:   {}", config.prefixes().join(", "));
    println!("Suffix:     {}", config.suffix());
    println!(
        "Space:      {} candidates",
        format_number(config.total_candidates())
    );
    println!("Workers:    {}", workers);
    println!();

    let pool = SearchEngine::new().start(config, workers)?;
    ctrlc_handler(pool.cancellation_token())?;

    println!("Searching... (Press Ctrl+C to stop)\n");

    let report_interval = Duration::from_secs(cli.report_interval.max(1));
    let outcome = loop {
        match pool.wait_for_event(report_interval) {
            PoolEvent::Hit(hit) => {
                pool.stop();
                println!("=== Match ===");
                println!("Card number: {}", hit.candidate);
                println!("Worker:      {}", hit.worker_id);
                println!();
                break MatchResult::Found(hit.candidate);
            }
            PoolEvent::Pending => print_progress(&pool),
            PoolEvent::Finished => break pool.finished_outcome(),
        }
    };

    print_final_stats(&pool);
    pool.join();

    match outcome {
        MatchResult::Found(candidate) => {
            CardRecord::new(candidate.as_str()).save(&settings.result_output_path)?;
            println!(
                "\nCard number saved to {}",
                settings.result_output_path.display()
            );
            Ok(0)
        }
        MatchResult::Exhausted => {
            println!("\nNo card number in the search space matches the digest.");
            Ok(EXIT_NOT_FOUND)
        }
        MatchResult::Interrupted => {
            println!("\nStopped by user.");
            Ok(EXIT_INTERRUPTED)
        }
    }
}

fn run_statistics(settings: &Settings, cpus: usize) -> CliResult {
    let config = Arc::new(settings.search_config()?);
    let worker_counts = settings.benchmark_worker_counts(cpus);
    let mut table = StatisticsTable::new(&settings.statistics_table_path);

    println!("Scaling Benchmark");
    println!("=================");
    println!("Worker counts: {:?}", worker_counts);
    println!("Table:         {}", table.path().display());
    println!();

    let benchmark = ScalingBenchmark::default();
    benchmark.run_with_progress(&config, &worker_counts, &mut table, |record, outcome| {
        println!(
            "[{:>3} worker(s)] {:>10.3}s  ({})",
            record.worker_count, record.elapsed_seconds, outcome
        );
    })?;

    println!("\nStatistics appended to {}", table.path().display());
    Ok(0)
}

fn check_saved_card(settings: &Settings) -> CliResult {
    let record = CardRecord::load(&settings.result_output_path)?;
    check_luhn(&record.card_number)
}

fn check_luhn(number: &str) -> CliResult {
    if luhn::is_valid(number)? {
        println!("{} passes the Luhn check.", number);
        Ok(0)
    } else {
        println!("{} fails the Luhn check.", number);
        Ok(EXIT_NOT_FOUND)
    }
}

fn visualize(settings: &Settings) -> CliResult {
    let table = StatisticsTable::new(&settings.statistics_table_path);
    let report = table.report()?;
    if report.is_empty() {
        eprintln!("Warning: {} has no rows", table.path().display());
    }

    let chart_path = settings.chart_path();
    write_chart(&report, &chart_path)?;
    if let Some((workers, seconds)) = report.fastest() {
        println!("Fastest:  {} worker(s), {:.3}s", workers, seconds);
    }
    println!("Chart saved to {}", chart_path.display());
    Ok(0)
}

fn print_progress(pool: &WorkerPool) {
    println!(
        "[{:>4}s] Tested {} candidates ({}/s, {:.1}%)",
        pool.elapsed().as_secs(),
        format_number(pool.total_candidates()),
        format_number(pool.candidates_per_second() as u64),
        pool.progress() * 100.0
    );
}

fn print_final_stats(pool: &WorkerPool) {
    println!("--- Final Statistics ---");
    println!(
        "Candidates tested: {}",
        format_number(pool.total_candidates())
    );
    println!("Time elapsed:      {:.2}s", pool.elapsed().as_secs_f64());
    println!(
        "Average speed:     {}/s",
        format_number(pool.candidates_per_second() as u64)
    );
    if pool.total_faults() > 0 {
        eprintln!(
            "Warning: {} work item(s) failed and were skipped",
            pool.total_faults()
        );
    }
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1e9)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1e6)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1e3)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(token: CancellationToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        token.cancel();
    })
}
