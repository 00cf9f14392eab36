//! Tracing initialisation and structured pipeline events.
//!
//! Call [`init_tracing`] once at program start; the pipeline emits
//! `event = "..."` records as each run folds and when the summary lands.
//! Respects `RUST_LOG` for fine-grained filtering.

use std::path::Path;

use tracing::{info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// `json` switches to newline-delimited JSON log lines; `level` is the
/// default verbosity when `RUST_LOG` is unset. Safe to call more than once;
/// only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// Emit event: one run triple correlated and folded into the history.
pub fn emit_triple_processed(stem: &str, probe_count: usize) {
    info!(event = "run.folded", stem = %stem, probes = probe_count);
}

/// Emit event: summary artifact written with its content digest.
pub fn emit_summary_written(path: &Path, probe_count: usize, digest: &str) {
    info!(
        event = "summary.written",
        path = %path.display(),
        probes = probe_count,
        digest = %digest,
    );
}
