//! Log subscriber setup.
//!
//! stdout carries native messaging frames, so log lines go to stderr.

use tracing_subscriber::EnvFilter;

use crate::error::HostError;

/// Environment variable whose directives override the configured filter.
pub const LOG_ENV: &str = "TABMARK_LOG";

pub fn init_tracing(default_filter: &str) -> Result<(), HostError> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| HostError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| HostError::Logging(e.to_string()))
}
