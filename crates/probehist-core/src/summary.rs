//! Summary artifact persistence.
//!
//! The aggregated history is written as one pretty-printed JSON document in
//! a single atomic step (temp file + rename), unconditionally replacing any
//! prior artifact. A companion `<output>.digest` file carries the SHA-256
//! hex digest of the serialized bytes for out-of-band integrity checks.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{ProbehistError, Result};
use crate::model::AggregatedHistory;
use crate::obs::emit_summary_written;

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Companion digest path for a summary artifact.
pub fn digest_path(summary_path: &Path) -> PathBuf {
    summary_path.with_extension("digest")
}

/// Serialize `history` to `path` atomically, then write the companion
/// digest.
///
/// Returns the digest hex string.
pub fn write_summary(history: &AggregatedHistory, path: &Path) -> Result<String> {
    let json = serde_json::to_vec_pretty(history)?;
    let digest = sha256_hex(&json);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    // Stage in the destination directory so the final rename stays on one
    // filesystem.
    let mut staged = NamedTempFile::new_in(&dir)?;
    std::io::Write::write_all(&mut staged, &json)?;
    staged
        .persist(path)
        .map_err(|e| ProbehistError::Io(e.error))?;

    std::fs::write(digest_path(path), digest.as_bytes())?;

    emit_summary_written(path, history.len(), &digest);
    Ok(digest)
}

/// Load a summary artifact, verifying it against its companion digest when
/// one is present.
pub fn read_summary(path: &Path) -> Result<AggregatedHistory> {
    let bytes = std::fs::read(path)?;

    let companion = digest_path(path);
    if companion.exists() {
        let expected = std::fs::read_to_string(&companion)?;
        let expected = expected.trim();
        let actual = sha256_hex(&bytes);
        if expected != actual {
            return Err(ProbehistError::DigestMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProbeRunSummary;

    fn sample_history() -> AggregatedHistory {
        let mut history = AggregatedHistory::new();
        history.insert(
            "plugin.probe".to_string(),
            vec![ProbeRunSummary {
                passed_total: 1,
                attempted_total: 2,
                attempt_count: 2,
                detectors: vec![],
                prompts: vec![],
                start_time: Some("T0".to_string()),
                end_time: Some("T1".to_string()),
            }],
        );
        history
    }

    #[test]
    fn test_write_read_roundtrip_with_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");

        let history = sample_history();
        let digest = write_summary(&history, &path).expect("write");
        assert_eq!(digest.len(), 64);
        assert!(digest_path(&path).exists());

        let loaded = read_summary(&path).expect("read");
        assert_eq!(loaded, history);
    }

    #[test]
    fn test_write_replaces_prior_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");
        std::fs::write(&path, b"stale content").expect("seed");

        write_summary(&sample_history(), &path).expect("write");

        let loaded = read_summary(&path).expect("read");
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_tampered_artifact_fails_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");
        write_summary(&sample_history(), &path).expect("write");

        std::fs::write(&path, b"{}").expect("tamper");

        let err = read_summary(&path).unwrap_err();
        assert!(matches!(err, ProbehistError::DigestMismatch { .. }));
    }

    #[test]
    fn test_read_without_companion_skips_verification() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");
        write_summary(&sample_history(), &path).expect("write");
        std::fs::remove_file(digest_path(&path)).expect("drop companion");

        let loaded = read_summary(&path).expect("read");
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_empty_history_serializes_to_empty_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");
        write_summary(&AggregatedHistory::new(), &path).expect("write");

        let text = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(text.trim(), "{}");
    }
}
