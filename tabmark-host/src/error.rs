//! Error types for the native host.

use crate::config::HostConfigError;
use crate::framing::FramingError;
use tabmark_storage::LmdbStoreError;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] HostConfigError),
    #[error(transparent)]
    Storage(#[from] LmdbStoreError),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error("Failed to install log subscriber: {0}")]
    Logging(String),
}
