//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never interleave with the operator messages on
//! stdout. `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::error::{AppResult, DaqError};

/// Build the filter: `RUST_LOG` when set, otherwise `level`.
pub fn env_filter(level: &str) -> AppResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| DaqError::Configuration(format!("Invalid log level '{level}': {e}"))),
    }
}

/// Install the global subscriber.
///
/// Calling this twice is harmless; the second subscriber is dropped.
pub fn init(level: &str) -> AppResult<()> {
    let filter = env_filter(level)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level, "Logging initialized");
    }
    Ok(())
}
