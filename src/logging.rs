//! Tracing subscriber setup.

use crate::error::{AccessError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes a formatted tracing subscriber with the given filter
/// directive (e.g. `"umbra=debug"`).
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| AccessError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| AccessError::InvalidArgument("Logging already initialized".into()))
}
