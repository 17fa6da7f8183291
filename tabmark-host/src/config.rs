//! Configuration loading for the native host.
//!
//! Every field is required; the file is located with `--config <path>` or
//! `TABMARK_HOST_CONFIG`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tabmark_background::BackgroundOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Directory of the LMDB key-value store.
    pub storage_path: PathBuf,
    pub storage_max_size_mb: usize,
    pub request_timeout_ms: u64,
    pub badge_settle_ms: u64,
    pub omnibox_limit: usize,
    pub omnibox_debounce_ms: u64,
    /// `EnvFilter` directives; `TABMARK_LOG` overrides them.
    pub log_filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HostConfigError {
    #[error("Missing configuration file path (use --config or TABMARK_HOST_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl HostConfig {
    pub fn load() -> Result<Self, HostConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(HostConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, HostConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, HostConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), HostConfigError> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(HostConfigError::InvalidValue {
                field: "storage_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.storage_max_size_mb == 0 {
            return Err(HostConfigError::InvalidValue {
                field: "storage_max_size_mb",
                reason: "must be > 0".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(HostConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.omnibox_limit == 0 {
            return Err(HostConfigError::InvalidValue {
                field: "omnibox_limit",
                reason: "must be > 0".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(HostConfigError::InvalidValue {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn background_options(&self) -> BackgroundOptions {
        BackgroundOptions {
            settle_delay: Duration::from_millis(self.badge_settle_ms),
            omnibox_limit: self.omnibox_limit,
            omnibox_debounce: Duration::from_millis(self.omnibox_debounce_ms),
        }
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("TABMARK_HOST_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
