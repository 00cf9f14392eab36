//! Domain model for probe run histories.
//!
//! These are the output-side types: what one scanner run contributes for each
//! probe, and the cross-run history the aggregator accumulates. Wire formats
//! for the scanner's own artifacts live in [`crate::events`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identity of a test category, e.g. `"plugin.probe_name"`.
///
/// Unique within one run's event log; recurs across runs.
pub type ProbeKey = String;

/// Composite lookup key correlating side-file data to an evaluation:
/// `(probe, short detector name)`.
pub type DetectorKey = (String, String);

/// Cross-run history: each probe maps to one entry per processed run file,
/// in file-processing order.
///
/// Append-only and deliberately not deduplicated: folding the same run in
/// twice yields two entries. Keys iterate in sorted order so serialized
/// output is stable.
pub type AggregatedHistory = BTreeMap<ProbeKey, Vec<ProbeRunSummary>>;

/// One adversarial input tried during a run.
///
/// Attempts are ephemeral: buffered only until the evaluation that closes
/// their batch, then either snapshotted into a [`ProbeRunSummary`] or
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub sequence_number: u64,
    /// Scanner-defined outcome code, passed through uninterpreted.
    pub status: i64,
    pub prompt_text: String,
}

/// A literal failing input recovered from the failure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailingExample {
    pub sequence_number: u64,
    pub prompt_text: String,
}

/// One detector's verdict on a batch of attempts for one probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Short detector name, namespace prefix stripped.
    pub detector_name: String,
    pub passed: u64,
    pub total: u64,
    /// Pass-through anomaly score from the report document, if annotated.
    pub anomaly_score: Option<String>,
    /// Failing inputs for this `(probe, detector)`, in failure-log order.
    pub failing_examples: Vec<FailingExample>,
}

/// Aggregate for one probe within one run.
///
/// `passed_total` and `attempted_total` are the sums of `passed` and `total`
/// over `detectors`. `prompts` is the attempt buffer snapshot taken at the
/// probe's first evaluation. `start_time`/`end_time` are back-filled once the
/// run's event log is fully consumed and are otherwise opaque scanner-format
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRunSummary {
    pub passed_total: u64,
    pub attempted_total: u64,
    /// Attempts buffered since the previous evaluation closed, accumulated
    /// over this probe's evaluations.
    pub attempt_count: u64,
    pub detectors: Vec<EvaluationRecord>,
    pub prompts: Vec<Attempt>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl ProbeRunSummary {
    /// Empty summary seeded with the attempt buffer snapshot.
    pub(crate) fn with_prompts(prompts: Vec<Attempt>) -> Self {
        Self {
            passed_total: 0,
            attempted_total: 0,
            attempt_count: 0,
            detectors: Vec::new(),
            prompts,
            start_time: None,
            end_time: None,
        }
    }
}

/// Strip a namespaced detector identifier down to its short name.
///
/// The prefix is removed at the last `.` separator:
/// `"probe.detectorclass.DetectorName"` becomes `"DetectorName"`. A name
/// without a separator is returned unchanged.
pub fn short_detector_name(detector: &str) -> &str {
    detector.rsplit_once('.').map_or(detector, |(_, tail)| tail)
}
