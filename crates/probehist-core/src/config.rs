//! Pipeline configuration and decode policy.
//!
//! [`PipelineConfig`] is constructed once at startup and threaded through the
//! pipeline entry point; nothing in the library reads ambient global state.

use std::path::PathBuf;

use crate::error::{ProbehistError, Result};

/// Locations of the run artifacts and the output summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding the per-run artifact triples.
    pub runs_dir: PathBuf,
    /// Destination path for the aggregated summary artifact.
    pub summary_path: PathBuf,
}

impl PipelineConfig {
    pub fn new(runs_dir: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            runs_dir: runs_dir.into(),
            summary_path: summary_path.into(),
        }
    }

    /// Check that the runs directory exists and is a directory.
    ///
    /// Called at startup; an unresolvable runs directory is fatal before any
    /// artifact is touched.
    pub fn validate(&self) -> Result<()> {
        let meta = std::fs::metadata(&self.runs_dir).map_err(|e| ProbehistError::RunsDir {
            path: self.runs_dir.clone(),
            source: e,
        })?;
        if !meta.is_dir() {
            return Err(ProbehistError::RunsDir {
                path: self.runs_dir.clone(),
                source: std::io::Error::other("not a directory"),
            });
        }
        Ok(())
    }
}

/// What to do when a line in a newline-delimited artifact fails to decode.
///
/// The default matches the historical behavior: one bad record aborts the
/// entire batch job with no partial output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Abort the whole job on the first undecodable line.
    #[default]
    FailFast,
    /// Drop undecodable lines, emitting a structured warning for each.
    SkipAndLog,
}
