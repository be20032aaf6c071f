//! Centralised tracing initialisation for traffic light binaries.
//!
//! Call [`init_tracing`] once at program start. Log lines are written to
//! stderr: stdout is reserved for the decision record that pipelines parse.
//!
//! Safe to call more than once; subsequent calls are silently ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "TRAFFIC_LIGHT_LOG";

/// Build the filter: `TRAFFIC_LIGHT_LOG`, then `RUST_LOG`, then `level`.
fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON log lines for log aggregation.
/// * `level`: default verbosity when neither env filter is set.
pub fn init_tracing(json: bool, level: Level) {
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(env_filter(level))
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter(level))
            .with(layer)
            .try_init()
            .ok();
    }
}
