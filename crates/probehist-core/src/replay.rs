//! Event-log replay.
//!
//! Sequentially consumes one run's event log and reconstructs, in event
//! order, the per-probe attempt batches and the evaluations that close them,
//! joining in anomaly scores and failing examples by `(probe, detector)`.
//!
//! Replay is a pure function of its inputs: the same log and lookup maps
//! always produce identical output.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::DecodePolicy;
use crate::error::Result;
use crate::events::{decode_lines, LogEntry};
use crate::hitlog::FailureIndex;
use crate::model::{
    short_detector_name, Attempt, EvaluationRecord, ProbeKey, ProbeRunSummary,
};
use crate::report::ScoreMap;

/// Replay a decoded event sequence into per-probe run summaries.
///
/// Attempts accumulate in a single transient buffer shared across probes;
/// the buffer is flushed and cleared only when an `eval` entry fires. When
/// several probes interleave attempts before either evaluates, the whole
/// buffer is attributed to whichever probe evaluates first — a known
/// correlation caveat of the artifact format, preserved here.
pub fn replay_events(
    entries: &[LogEntry],
    scores: &ScoreMap,
    failures: &FailureIndex,
) -> BTreeMap<ProbeKey, ProbeRunSummary> {
    let mut summaries: BTreeMap<ProbeKey, ProbeRunSummary> = BTreeMap::new();
    let mut buffer: Vec<Attempt> = Vec::new();
    let mut start_time: Option<String> = None;
    let mut end_time: Option<String> = None;

    for entry in entries {
        match entry {
            LogEntry::Init { start_time: t } => {
                start_time = t.clone();
            }
            LogEntry::Attempt { seq, status, prompt } => {
                buffer.push(Attempt {
                    sequence_number: *seq,
                    status: *status,
                    prompt_text: prompt.clone(),
                });
            }
            LogEntry::Eval {
                probe,
                detector,
                passed,
                total,
            } => {
                let detector_name = short_detector_name(detector).to_string();
                let key = (probe.clone(), detector_name.clone());

                // The prompts snapshot is taken once, at the probe's first
                // evaluation; later evaluations inherit it.
                let summary = summaries
                    .entry(probe.clone())
                    .or_insert_with(|| ProbeRunSummary::with_prompts(buffer.clone()));

                summary.detectors.push(EvaluationRecord {
                    detector_name,
                    passed: *passed,
                    total: *total,
                    anomaly_score: scores.get(&key).cloned(),
                    failing_examples: failures.get(&key).cloned().unwrap_or_default(),
                });
                summary.passed_total += passed;
                summary.attempted_total += total;
                summary.attempt_count += buffer.len() as u64;

                buffer.clear();
            }
            LogEntry::Completion { end_time: t } => {
                // Does not close the run; later evals would still count.
                end_time = t.clone();
            }
            LogEntry::Unknown => {}
        }
    }

    // Trailing attempts never followed by an eval are dropped with the buffer.
    for summary in summaries.values_mut() {
        summary.start_time = start_time.clone();
        summary.end_time = end_time.clone();
    }
    summaries
}

/// Decode and replay the event log at `path`.
pub fn replay_log(
    path: &Path,
    scores: &ScoreMap,
    failures: &FailureIndex,
    policy: DecodePolicy,
) -> Result<BTreeMap<ProbeKey, ProbeRunSummary>> {
    let entries: Vec<LogEntry> = decode_lines(path, policy)?;
    Ok(replay_events(&entries, scores, failures))
}
