//! # Structured Logging
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over
//! `LOG_LEVEL` so individual modules can be turned up while debugging.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};
use crate::{Error, Result};

/// Build the log filter from `RUST_LOG`, falling back to the configured level
pub fn build_env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .map_err(|e| Error::config(format!("Invalid RUST_LOG directives: {}", e))),
        _ => Ok(EnvFilter::new(config.log_level.as_directive())),
    }
}

/// Install the global subscriber
///
/// A subscriber that is already installed (e.g. by a test harness) is left
/// in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = build_env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed; keeping it");
    }

    Ok(())
}

/// Create the span every server task runs under
#[macro_export]
macro_rules! app_span {
    () => {
        tracing::info_span!("csi-debugger", app = $crate::APP_NAME, version = $crate::VERSION)
    };
}
