//! Caches layered on the key-value store.
//!
//! # Single Slot
//!
//! The server metadata cache holds exactly one record: the answer for the
//! most recently checked URL. A read for any other URL is a miss, and every
//! successful check overwrites the slot, whichever URL it was for. Saving,
//! editing or deleting a bookmark clears the slot so the next read refetches.
//!
//! # Ordering
//!
//! There is no ordering between concurrent refreshes. The last one to
//! complete owns the slot, even if it was issued first.
//!
//! # Example
//!
//! ```ignore
//! let cache = MetadataCache::restore(store).await;
//!
//! // Navigation: only fetches when the user opted into precaching
//! let record = cache.refresh(&ctx, &tab.url, FetchIntent::Precache).await;
//!
//! // Popup opened: always fetches on a miss
//! let record = cache.refresh(&ctx, &tab.url, FetchIntent::Explicit).await;
//!
//! // After a save
//! cache.clear().await;
//! ```

pub mod metadata;
pub mod profile;
pub mod stats;

pub use metadata::MetadataCache;
pub use profile::ProfileCache;
pub use stats::CacheStats;
