//! tabmark Storage - Key-Value Stores and Metadata Cache
//!
//! Durable and in-memory implementations of the `KeyValueStore` contract,
//! plus the caches layered on top of it: the single-slot server metadata
//! cache, the user profile cache and the configuration blob.

pub mod cache;
pub mod config_store;
pub mod kv;

pub use cache::{CacheStats, MetadataCache, ProfileCache};
pub use config_store::ConfigurationStore;
pub use kv::{InMemoryKeyValueStore, LmdbKeyValueStore, LmdbStoreError};
