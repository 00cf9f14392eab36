//! Run discovery and cross-run aggregation.
//!
//! Each scanner run leaves three artifacts sharing a filename stem: the
//! event log, the report document, and the failure log. The aggregator
//! discovers those triples, processes them one at a time, and folds every
//! per-probe summary into the append-only [`AggregatedHistory`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{DecodePolicy, PipelineConfig};
use crate::error::{ProbehistError, Result};
use crate::hitlog::index_failures;
use crate::model::{AggregatedHistory, ProbeKey, ProbeRunSummary};
use crate::obs::emit_triple_processed;
use crate::replay::replay_log;
use crate::report::extract_scores_from_file;

/// Filename suffix identifying a run's event log.
pub const EVENT_LOG_SUFFIX: &str = ".report.jsonl";
/// Filename suffix of the report document sharing the event log's stem.
pub const REPORT_DOC_SUFFIX: &str = ".report.html";
/// Filename suffix of the failure log sharing the event log's stem.
pub const HITLOG_SUFFIX: &str = ".hitlog.jsonl";

/// The three artifact paths of one scanner run.
///
/// Only the event log is required to exist; the two side-files are optional
/// and yield empty lookups when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTriple {
    /// Shared filename stem identifying the run.
    pub stem: String,
    pub event_log: PathBuf,
    pub report_doc: PathBuf,
    pub hitlog: PathBuf,
}

impl RunTriple {
    /// Derive the triple's paths for `stem` inside `runs_dir`.
    pub fn from_stem(runs_dir: &Path, stem: &str) -> Self {
        Self {
            stem: stem.to_string(),
            event_log: runs_dir.join(format!("{stem}{EVENT_LOG_SUFFIX}")),
            report_doc: runs_dir.join(format!("{stem}{REPORT_DOC_SUFFIX}")),
            hitlog: runs_dir.join(format!("{stem}{HITLOG_SUFFIX}")),
        }
    }
}

/// Discover run triples in `runs_dir` by their event logs.
///
/// Triples surface in directory iteration order; no explicit sort is
/// applied. Consumers needing chronology sort the folded summaries by
/// `start_time` instead.
pub fn discover_triples(runs_dir: &Path) -> Result<Vec<RunTriple>> {
    let entries = std::fs::read_dir(runs_dir).map_err(|e| ProbehistError::RunsDir {
        path: runs_dir.to_path_buf(),
        source: e,
    })?;

    let mut triples = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(stem) = name.strip_suffix(EVENT_LOG_SUFFIX) {
            triples.push(RunTriple::from_stem(runs_dir, stem));
        }
    }
    Ok(triples)
}

/// Process one run triple: score extraction, failure indexing, then event
/// log replay joined over both lookups.
pub fn process_triple(
    triple: &RunTriple,
    policy: DecodePolicy,
) -> Result<BTreeMap<ProbeKey, ProbeRunSummary>> {
    let scores = extract_scores_from_file(&triple.report_doc)?;
    let failures = index_failures(&triple.hitlog, policy)?;
    replay_log(&triple.event_log, &scores, &failures, policy)
}

/// Append every per-probe summary of one run to the history.
///
/// Purely additive: a run folded in twice contributes two entries per
/// touched probe.
pub fn fold_run(history: &mut AggregatedHistory, run: BTreeMap<ProbeKey, ProbeRunSummary>) {
    for (probe, summary) in run {
        history.entry(probe).or_default().push(summary);
    }
}

/// Run the full correlation pipeline over every triple in the configured
/// runs directory.
///
/// Triples are processed strictly one at a time; any fatal error aborts the
/// whole batch before a summary is written.
pub fn run_pipeline(config: &PipelineConfig, policy: DecodePolicy) -> Result<AggregatedHistory> {
    config.validate()?;

    let mut history = AggregatedHistory::new();
    for triple in discover_triples(&config.runs_dir)? {
        let run = process_triple(&triple, policy)?;
        emit_triple_processed(&triple.stem, run.len());
        fold_run(&mut history, run);
    }
    Ok(history)
}
