//! Extension configuration as edited on the options page.
//!
//! The blob is stored with the option page's camelCase field names. Every
//! field falls back to its default when absent so blobs written by older
//! versions stay readable.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

const DEFAULT_CLOSE_ON_SAVE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionConfiguration {
    pub base_url: String,
    pub token: String,
    /// Space separated tag names applied to new bookmarks.
    #[serde(rename = "default_tags")]
    pub default_tags: String,
    pub unread_selected: bool,
    pub share_selected: bool,
    pub use_browser_metadata: bool,
    pub precache_enabled: bool,
    pub close_add_bookmark_window_on_save: bool,
    pub close_add_bookmark_window_on_save_ms: u64,
    pub run_singlefile: bool,
}

impl Default for ExtensionConfiguration {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            default_tags: String::new(),
            unread_selected: false,
            share_selected: false,
            use_browser_metadata: false,
            precache_enabled: false,
            close_add_bookmark_window_on_save: false,
            close_add_bookmark_window_on_save_ms: DEFAULT_CLOSE_ON_SAVE_MS,
            run_singlefile: false,
        }
    }
}

impl ExtensionConfiguration {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_precache(mut self, enabled: bool) -> Self {
        self.precache_enabled = enabled;
        self
    }

    pub fn with_default_tags(mut self, tags: impl Into<String>) -> Self {
        self.default_tags = tags.into();
        self
    }

    /// Both a base URL and a token are required for any network operation.
    pub fn is_complete(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.token.trim().is_empty()
    }

    /// Base URL without trailing slashes, ready for path concatenation.
    pub fn api_base(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Default tags split on whitespace, empty entries dropped.
    pub fn default_tag_names(&self) -> Vec<String> {
        self.default_tags
            .split(' ')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Milliseconds before the add-bookmark window closes after a save, if enabled.
    pub fn close_on_save_ms(&self) -> Option<u64> {
        self.close_add_bookmark_window_on_save
            .then_some(self.close_add_bookmark_window_on_save_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "baseUrl".to_string(),
            });
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "token".to_string(),
            });
        }
        if !crate::url::is_bookmarkable(self.base_url.trim()) {
            return Err(ConfigError::InvalidValue {
                field: "baseUrl".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }
}
