//! Lazily built extension context.

use std::sync::{Arc, Mutex};

use tabmark_core::{
    ConfigError, ExtensionConfiguration, ExtensionContext, GatewayFactory, KeyValueStore,
    TabmarkResult,
};
use tabmark_storage::ConfigurationStore;

/// Hands out the [`ExtensionContext`] for the stored configuration.
///
/// The configuration is re-read on every call. The context (and the gateway
/// client inside it) is only rebuilt when that configuration changed since
/// the last call.
pub struct ContextProvider {
    configs: ConfigurationStore,
    factory: Arc<dyn GatewayFactory>,
    current: Mutex<Option<Arc<ExtensionContext>>>,
}

impl ContextProvider {
    pub fn new(store: Arc<dyn KeyValueStore>, factory: Arc<dyn GatewayFactory>) -> Self {
        Self {
            configs: ConfigurationStore::new(store),
            factory,
            current: Mutex::new(None),
        }
    }

    pub async fn current(&self) -> Arc<ExtensionContext> {
        let configuration = match self.configs.load().await {
            Ok(configuration) => configuration,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load configuration, using defaults");
                ExtensionConfiguration::default()
            }
        };

        if let Some(ctx) = self.cached_for(&configuration) {
            return ctx;
        }

        let ctx = Arc::new(self.build(configuration));
        if let Ok(mut current) = self.current.lock() {
            *current = Some(ctx.clone());
        }
        ctx
    }

    /// Check that `configuration` reaches a working service, then store it.
    pub async fn save_configuration(
        &self,
        configuration: ExtensionConfiguration,
    ) -> TabmarkResult<()> {
        configuration.validate()?;
        let gateway = self.factory.connect(&configuration)?;
        if !gateway.test_connection().await {
            return Err(ConfigError::ConnectionFailed {
                base_url: configuration.base_url.clone(),
            }
            .into());
        }
        self.configs.save(&configuration).await?;
        Ok(())
    }

    fn cached_for(&self, configuration: &ExtensionConfiguration) -> Option<Arc<ExtensionContext>> {
        self.current
            .lock()
            .ok()?
            .as_ref()
            .filter(|ctx| ctx.configuration == *configuration)
            .cloned()
    }

    fn build(&self, configuration: ExtensionConfiguration) -> ExtensionContext {
        if !configuration.is_complete() {
            tracing::debug!("Configuration incomplete, network features disabled");
            return ExtensionContext::unconfigured(configuration);
        }
        match self.factory.connect(&configuration) {
            Ok(gateway) => {
                tracing::info!(base_url = %configuration.base_url, "Connected bookmark gateway");
                ExtensionContext::new(configuration, Some(gateway))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build bookmark gateway");
                ExtensionContext::unconfigured(configuration)
            }
        }
    }
}
