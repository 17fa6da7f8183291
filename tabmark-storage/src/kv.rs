//! Key-value store implementations.
//!
//! `LmdbKeyValueStore` uses the heed crate (Rust bindings for LMDB) for the
//! durable store the native host runs with. `InMemoryKeyValueStore` backs
//! tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use tabmark_core::{KeyValueStore, StorageError};

/// Error type for opening the LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbStoreError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LmdbStoreError> for StorageError {
    fn from(e: LmdbStoreError) -> Self {
        StorageError::Unavailable {
            reason: e.to_string(),
        }
    }
}

/// LMDB-backed string store.
///
/// Each `get` runs in its own read transaction and each `set` in its own
/// write transaction, so a value is either fully written or absent.
pub struct LmdbKeyValueStore {
    env: Env,
    db: Database<Str, Str>,
}

impl LmdbKeyValueStore {
    /// Open (or create) a store in `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory where LMDB files will be stored
    /// * `max_size_mb` - Maximum size of the database in megabytes
    pub fn open<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbStoreError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbStoreError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        let db: Database<Str, Str> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbStoreError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbStoreError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }
}

#[async_trait]
impl KeyValueStore for LmdbKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let read_failed = |reason: String| StorageError::ReadFailed {
            key: key.to_string(),
            reason,
        };

        let rtxn = self.env.read_txn().map_err(|e| read_failed(e.to_string()))?;
        let value = self
            .db
            .get(&rtxn, key)
            .map_err(|e| read_failed(e.to_string()))?;
        Ok(value.map(str::to_string))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_failed = |reason: String| StorageError::WriteFailed {
            key: key.to_string(),
            reason,
        };

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| write_failed(e.to_string()))?;
        self.db
            .put(&mut wtxn, key, value)
            .map_err(|e| write_failed(e.to_string()))?;
        wtxn.commit().map_err(|e| write_failed(e.to_string()))?;
        Ok(())
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Raw stored value, for assertions.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
