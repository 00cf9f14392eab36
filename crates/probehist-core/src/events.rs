//! Wire formats for the scanner's newline-delimited artifacts.
//!
//! The event log and the failure log both carry one self-describing JSON
//! record per line. Optional fields substitute defaults when absent so that
//! heterogeneous detector output stays decodable; a line that is not valid
//! JSON (or an `eval` without its probe) is a malformed record, handled per
//! [`DecodePolicy`].

use std::io::BufRead;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::config::DecodePolicy;
use crate::error::{ProbehistError, Result};

/// One entry of a run's event log, discriminated by `entry_type`.
///
/// Record types the pipeline does not consume are tolerated and decoded as
/// [`LogEntry::Unknown`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "entry_type", rename_all = "lowercase")]
pub enum LogEntry {
    /// Run preamble carrying the start timestamp.
    Init {
        #[serde(default)]
        start_time: Option<String>,
    },
    /// One adversarial input submitted to the target.
    Attempt {
        #[serde(default)]
        seq: u64,
        #[serde(default)]
        status: i64,
        #[serde(default)]
        prompt: String,
    },
    /// A detector's verdict closing out a batch of attempts.
    Eval {
        probe: String,
        #[serde(default)]
        detector: String,
        #[serde(default)]
        passed: u64,
        #[serde(default)]
        total: u64,
    },
    /// Run epilogue carrying the end timestamp.
    Completion {
        #[serde(default)]
        end_time: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// One line of the failure log: a failing example keyed by probe and
/// detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HitRecord {
    #[serde(default)]
    pub probe: String,
    #[serde(default)]
    pub detector: String,
    #[serde(default)]
    pub attempt_seq: u64,
    #[serde(default)]
    pub prompt: String,
}

/// Decode every line of `path` as a `T`.
///
/// Under [`DecodePolicy::FailFast`] the first undecodable line aborts with
/// [`ProbehistError::MalformedRecord`]; under [`DecodePolicy::SkipAndLog`]
/// bad lines are dropped with a warning and decoding continues.
pub fn decode_lines<T: DeserializeOwned>(path: &Path, policy: DecodePolicy) -> Result<Vec<T>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => match policy {
                DecodePolicy::FailFast => {
                    return Err(ProbehistError::malformed(path, idx + 1, e));
                }
                DecodePolicy::SkipAndLog => {
                    warn!(
                        event = "decode.line_skipped",
                        path = %path.display(),
                        line = idx + 1,
                        error = %e,
                    );
                }
            },
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(dir: &tempfile::TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).expect("create");
        for line in lines {
            writeln!(f, "{line}").expect("write");
        }
        path
    }

    #[test]
    fn test_decode_eval_entry() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"entry_type":"eval","probe":"P","detector":"mod.D","passed":1,"total":2}"#)
                .expect("decode");
        assert_eq!(
            entry,
            LogEntry::Eval {
                probe: "P".to_string(),
                detector: "mod.D".to_string(),
                passed: 1,
                total: 2,
            }
        );
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"entry_type":"eval","probe":"P"}"#).expect("decode");
        assert_eq!(
            entry,
            LogEntry::Eval {
                probe: "P".to_string(),
                detector: String::new(),
                passed: 0,
                total: 0,
            }
        );

        let entry: LogEntry = serde_json::from_str(r#"{"entry_type":"attempt"}"#).expect("decode");
        assert_eq!(
            entry,
            LogEntry::Attempt {
                seq: 0,
                status: 0,
                prompt: String::new(),
            }
        );
    }

    #[test]
    fn test_eval_without_probe_is_malformed() {
        let result = serde_json::from_str::<LogEntry>(r#"{"entry_type":"eval","passed":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unrecognized_entry_type_tolerated() {
        let entry: LogEntry =
            serde_json::from_str(r#"{"entry_type":"config","setting":"x"}"#).expect("decode");
        assert_eq!(entry, LogEntry::Unknown);
    }

    #[test]
    fn test_hit_record_all_fields_optional() {
        let rec: HitRecord = serde_json::from_str(r#"{"probe":"P"}"#).expect("decode");
        assert_eq!(rec.probe, "P");
        assert_eq!(rec.detector, "");
        assert_eq!(rec.attempt_seq, 0);
        assert_eq!(rec.prompt, "");
    }

    #[test]
    fn test_decode_lines_fail_fast_reports_line_number() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_lines(
            &dir,
            "bad.jsonl",
            &[r#"{"probe":"P"}"#, "not json", r#"{"probe":"Q"}"#],
        );

        let err = decode_lines::<HitRecord>(&path, DecodePolicy::FailFast).unwrap_err();
        match err {
            ProbehistError::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_lines_skip_and_log_keeps_good_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_lines(
            &dir,
            "bad.jsonl",
            &[r#"{"probe":"P"}"#, "not json", r#"{"probe":"Q"}"#],
        );

        let records =
            decode_lines::<HitRecord>(&path, DecodePolicy::SkipAndLog).expect("skip policy");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].probe, "P");
        assert_eq!(records[1].probe, "Q");
    }
}
