//! Error taxonomy for artifact processing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbehistError {
    /// A line in a newline-delimited artifact could not be decoded.
    ///
    /// Fatal under [`DecodePolicy::FailFast`](crate::config::DecodePolicy);
    /// the underlying decode error is preserved as the source.
    #[error("malformed record at {path}:{line}")]
    MalformedRecord {
        path: PathBuf,
        /// 1-based line number of the offending record.
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("runs directory {path} is not readable")]
    RunsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("summary digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbehistError {
    pub(crate) fn malformed(path: &std::path::Path, line: usize, source: serde_json::Error) -> Self {
        ProbehistError::MalformedRecord {
            path: path.to_path_buf(),
            line,
            source,
        }
    }
}

/// Result type for artifact processing operations.
pub type Result<T> = std::result::Result<T, ProbehistError>;
