//! Cache statistics.

use serde::Serialize;

/// Counters describing how the metadata cache has been used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Refreshes answered from the slot.
    pub hits: u64,
    /// Refreshes that found no record for their URL.
    pub misses: u64,
    /// Misses not fetched because precaching is disabled.
    pub precache_skips: u64,
    /// Gateway calls that failed; nothing was cached for them.
    pub gateway_failures: u64,
    /// Records replaced by a record for a different URL.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
