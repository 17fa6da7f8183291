//! Error types for tabmark operations

use thiserror::Error;

/// Failures talking to the remote bookmark service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Unexpected status {status} from {endpoint}: {message}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Validation error: {body}")]
    Validation { body: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Gateway client could not be built: {reason}")]
    Client { reason: String },
}

/// Key-value storage failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Read of {key} failed: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Write of {key} failed: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Stored value under {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Extension configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not connect to {base_url} with the given token")]
    ConnectionFailed { base_url: String },
}

/// Host badge API failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BadgeError {
    #[error("Badge host unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Master error type for all tabmark errors.
#[derive(Debug, Clone, Error)]
pub enum TabmarkError {
    #[error("Extension is not configured (base URL and token are required)")]
    ConfigurationIncomplete,

    #[error("URL cannot be bookmarked: {url}")]
    InvalidUrl { url: String },

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Badge error: {0}")]
    Badge(#[from] BadgeError),
}

/// Result type alias for tabmark operations.
pub type TabmarkResult<T> = Result<T, TabmarkError>;

// =============================================================================
// TESTS
// =============================================================================
