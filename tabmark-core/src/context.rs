//! Snapshot of everything an operation needs to talk to the service.

use std::fmt;
use std::sync::Arc;

use crate::config::ExtensionConfiguration;
use crate::error::{TabmarkError, TabmarkResult};
use crate::gateway::BookmarkGateway;

/// Configuration snapshot plus the gateway built from it.
///
/// `gateway` is `None` whenever the configuration is incomplete. Contexts are
/// immutable; a configuration change produces a new context.
#[derive(Clone)]
pub struct ExtensionContext {
    pub configuration: ExtensionConfiguration,
    gateway: Option<Arc<dyn BookmarkGateway>>,
}

impl ExtensionContext {
    pub fn new(
        configuration: ExtensionConfiguration,
        gateway: Option<Arc<dyn BookmarkGateway>>,
    ) -> Self {
        let gateway = if configuration.is_complete() {
            gateway
        } else {
            None
        };
        Self {
            configuration,
            gateway,
        }
    }

    /// A context that can never reach the network.
    pub fn unconfigured(configuration: ExtensionConfiguration) -> Self {
        Self {
            configuration,
            gateway: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn gateway(&self) -> Option<&dyn BookmarkGateway> {
        self.gateway.as_deref()
    }

    /// The gateway, or `ConfigurationIncomplete` for user-facing paths.
    pub fn require_gateway(&self) -> TabmarkResult<&dyn BookmarkGateway> {
        self.gateway().ok_or(TabmarkError::ConfigurationIncomplete)
    }
}

impl fmt::Debug for ExtensionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContext")
            .field("base_url", &self.configuration.base_url)
            .field("precache_enabled", &self.configuration.precache_enabled)
            .field("ready", &self.is_ready())
            .finish()
    }
}
