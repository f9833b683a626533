//! Process-wide logging setup.
//!
//! A single process with a single store has no use for a fleet-wide
//! OpenTelemetry/OTLP export pipeline, so plain `tracing-subscriber`
//! output (driven by `--log-level`/`RUST_LOG`) is the whole story.
use tracing_subscriber::EnvFilter;

pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
