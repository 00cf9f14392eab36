//! probehist core — artifact correlation and aggregation for security-probe
//! run histories.
//!
//! Each scanner run leaves three artifacts sharing a filename stem:
//! - an event log (`*.report.jsonl`) replayed into per-probe summaries,
//! - a report document (`*.report.html`) carrying anomaly-score annotations,
//! - a failure log (`*.hitlog.jsonl`) listing the literal failing inputs.
//!
//! The pipeline correlates the three by `(probe, detector)` key, folds every
//! run into an append-only per-probe history, and persists the result as one
//! JSON summary artifact:
//!
//! ```no_run
//! use probehist_core::{run_pipeline, write_summary, DecodePolicy, PipelineConfig};
//!
//! # fn main() -> probehist_core::Result<()> {
//! let config = PipelineConfig::new("scan_runs", "summary.json");
//! let history = run_pipeline(&config, DecodePolicy::default())?;
//! write_summary(&history, &config.summary_path)?;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod events;
pub mod hitlog;
pub mod model;
pub mod obs;
pub mod replay;
pub mod report;
pub mod summary;

// Re-export key types
pub use aggregate::{discover_triples, fold_run, process_triple, run_pipeline, RunTriple};
pub use config::{DecodePolicy, PipelineConfig};
pub use error::{ProbehistError, Result};
pub use model::{
    short_detector_name, AggregatedHistory, Attempt, EvaluationRecord, FailingExample, ProbeKey,
    ProbeRunSummary,
};
pub use obs::init_tracing;
pub use summary::{read_summary, write_summary};

/// probehist version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
