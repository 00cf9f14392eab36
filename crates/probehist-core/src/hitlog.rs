//! Failure-log indexing.
//!
//! The failure log is newline-delimited JSON, one failing example per line.
//! Indexing groups examples by `(probe, detector)` while preserving the
//! file's line order within each key.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::DecodePolicy;
use crate::error::Result;
use crate::events::{decode_lines, HitRecord};
use crate::model::{DetectorKey, FailingExample};

/// Lookup from `(probe, detector)` to that pair's failing examples, in
/// file order.
pub type FailureIndex = BTreeMap<DetectorKey, Vec<FailingExample>>;

/// Index every failing example in the log at `path`.
///
/// Duplicate keys across lines append rather than replace. An absent log
/// yields an empty index, not an error; an undecodable line is handled per
/// `policy`.
pub fn index_failures(path: &Path, policy: DecodePolicy) -> Result<FailureIndex> {
    if !path.exists() {
        return Ok(FailureIndex::new());
    }

    let records: Vec<HitRecord> = decode_lines(path, policy)?;
    let mut index = FailureIndex::new();
    for record in records {
        index
            .entry((record.probe, record.detector))
            .or_insert_with(Vec::new)
            .push(FailingExample {
                sequence_number: record.attempt_seq,
                prompt_text: record.prompt,
            });
    }
    Ok(index)
}
