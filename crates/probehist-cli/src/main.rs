//! probehist - probe run-history aggregation CLI
//!
//! ## Commands
//!
//! - `aggregate`: correlate every run triple in the runs directory and write
//!   the summary artifact
//! - `inspect`: load an existing summary and print per-probe run history

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use probehist_core::{
    read_summary, run_pipeline, write_summary, DecodePolicy, PipelineConfig, ProbeRunSummary,
};

#[derive(Parser)]
#[command(name = "probehist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run-history aggregation for LLM security probe artifacts", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate all run artifacts and write the aggregated summary
    Aggregate {
        /// Directory holding the per-run artifact triples
        #[arg(long, env = "PROBEHIST_RUNS_DIR")]
        runs_dir: PathBuf,

        /// Destination path for the summary artifact
        #[arg(short, long, env = "PROBEHIST_SUMMARY_PATH")]
        output: PathBuf,

        /// Drop undecodable artifact lines instead of aborting the batch
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Print per-probe run history from an existing summary
    Inspect {
        /// Path of the summary artifact to read
        #[arg(short, long, env = "PROBEHIST_SUMMARY_PATH")]
        output: PathBuf,

        /// Restrict output to one probe
        #[arg(long)]
        probe: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    probehist_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Aggregate {
            runs_dir,
            output,
            skip_malformed,
        } => cmd_aggregate(runs_dir, output, skip_malformed),
        Commands::Inspect { output, probe } => cmd_inspect(&output, probe.as_deref()),
    }
}

fn cmd_aggregate(runs_dir: PathBuf, output: PathBuf, skip_malformed: bool) -> Result<()> {
    let policy = if skip_malformed {
        DecodePolicy::SkipAndLog
    } else {
        DecodePolicy::FailFast
    };
    let config = PipelineConfig::new(runs_dir, output);

    let history = run_pipeline(&config, policy).context("Failed to aggregate run artifacts")?;
    let run_count: usize = history.values().map(Vec::len).sum();
    write_summary(&history, &config.summary_path).context("Failed to write summary artifact")?;

    info!(
        probes = history.len(),
        runs = run_count,
        path = %config.summary_path.display(),
        "summary saved with full run history per probe",
    );
    Ok(())
}

fn cmd_inspect(summary_path: &std::path::Path, probe: Option<&str>) -> Result<()> {
    let history = read_summary(summary_path).context("Failed to read summary artifact")?;

    match probe {
        Some(name) => {
            let runs = history
                .get(name)
                .with_context(|| format!("No history for probe '{name}'"))?;
            print_probe(name, runs);
        }
        None => {
            for (name, runs) in &history {
                print_probe(name, runs);
            }
        }
    }
    Ok(())
}

fn print_probe(name: &str, runs: &[ProbeRunSummary]) {
    println!("{name} ({} runs)", runs.len());
    for run in chronological(runs) {
        let started = run.start_time.as_deref().unwrap_or("unknown start");
        let failures = run.attempted_total.saturating_sub(run.passed_total);
        println!(
            "  {started}  passed {}/{}  failures {failures}  attempts {}  detectors {}  health {}",
            run.passed_total,
            run.attempted_total,
            run.attempt_count,
            run.detectors.len(),
            health_score(run),
        );
    }
}

/// Order runs by start time when every timestamp parses as RFC 3339;
/// otherwise keep file-processing order.
fn chronological(runs: &[ProbeRunSummary]) -> Vec<&ProbeRunSummary> {
    let mut keyed: Vec<(Option<chrono::DateTime<chrono::FixedOffset>>, &ProbeRunSummary)> = runs
        .iter()
        .map(|run| {
            let ts = run
                .start_time
                .as_deref()
                .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok());
            (ts, run)
        })
        .collect();

    if keyed.iter().all(|(ts, _)| ts.is_some()) {
        keyed.sort_by_key(|(ts, _)| *ts);
    }
    keyed.into_iter().map(|(_, run)| run).collect()
}

fn health_score(run: &ProbeRunSummary) -> String {
    if run.attempted_total == 0 {
        return "n/a".to_string();
    }
    let rate = run.passed_total as f64 / run.attempted_total as f64;
    format!("{:.1}%", rate * 100.0)
}
