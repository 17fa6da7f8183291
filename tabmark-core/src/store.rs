//! Key-value store contract and JSON helpers.
//!
//! Values are opaque strings. Structured values are stored as JSON without a
//! schema version, so readers must tolerate older layouts.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StorageError;

/// Key of the extension configuration blob.
pub const CONFIG_KEY: &str = "ld_ext_config";

/// Key of the single metadata cache slot.
pub const SERVER_METADATA_CACHE_KEY: &str = "ld_server_metadata_cache";

/// Key of the cached user profile.
pub const PROFILE_CACHE_KEY: &str = "ld_profile_cache";

/// Durable asynchronous string storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value.
///
/// A missing key and a stored JSON `null` both read as `None`.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str::<Option<T>>(&raw).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Encode and write a JSON value; `None` writes the `null` sentinel.
pub async fn write_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: Option<&T>,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(&value).map_err(|e| StorageError::WriteFailed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, &raw).await
}
