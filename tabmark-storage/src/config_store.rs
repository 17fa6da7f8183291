//! Persistence of the extension configuration blob.

use std::sync::Arc;

use tabmark_core::{
    read_json, write_json, ExtensionConfiguration, KeyValueStore, StorageError, CONFIG_KEY,
};

pub struct ConfigurationStore {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigurationStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the stored configuration, or the defaults when none was saved.
    pub async fn load(&self) -> Result<ExtensionConfiguration, StorageError> {
        Ok(read_json(self.store.as_ref(), CONFIG_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save(&self, configuration: &ExtensionConfiguration) -> Result<(), StorageError> {
        write_json(self.store.as_ref(), CONFIG_KEY, Some(configuration)).await?;
        tracing::info!(base_url = %configuration.base_url, "Saved extension configuration");
        Ok(())
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}
