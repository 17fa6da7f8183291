//! Single-slot server metadata cache.
//!
//! The slot is persisted under [`SERVER_METADATA_CACHE_KEY`] and mirrored in
//! memory so lookups never touch the store. The mirror is authoritative for
//! the running process; the store only matters across restarts. Persisting
//! follows the order of mirror writes, so the store never ends on an older
//! slot than the mirror.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tabmark_core::{
    is_bookmarkable, read_json, write_json, BookmarkGateway, CachedMetadataRecord,
    CheckResponse, ExtensionContext, FetchIntent, GatewayError, KeyValueStore,
    SERVER_METADATA_CACHE_KEY,
};

use super::stats::CacheStats;

pub struct MetadataCache {
    store: Arc<dyn KeyValueStore>,
    slot: RwLock<Option<CachedMetadataRecord>>,
    /// Sequence of the latest in-memory slot write.
    written: AtomicU64,
    /// Sequence of the latest slot write handed to the store.
    persisted: tokio::sync::Mutex<u64>,
    stats: Mutex<CacheStats>,
}

impl MetadataCache {
    /// An empty cache over `store`; the persisted slot is not read.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            slot: RwLock::new(None),
            written: AtomicU64::new(0),
            persisted: tokio::sync::Mutex::new(0),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// Load the persisted slot, for a cold start.
    ///
    /// An unreadable or corrupt slot is logged and treated as empty.
    pub async fn restore(store: Arc<dyn KeyValueStore>) -> Self {
        let slot = match read_json::<CachedMetadataRecord>(store.as_ref(), SERVER_METADATA_CACHE_KEY)
            .await
        {
            Ok(slot) => slot,
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore metadata cache, starting empty");
                None
            }
        };
        Self {
            store,
            slot: RwLock::new(slot),
            written: AtomicU64::new(0),
            persisted: tokio::sync::Mutex::new(0),
            stats: Mutex::new(CacheStats::default()),
        }
    }

    /// The cached record for `url`, if the slot holds one. Never does I/O.
    pub fn lookup(&self, url: &str) -> Option<CachedMetadataRecord> {
        self.slot
            .read()
            .ok()?
            .as_ref()
            .filter(|record| record.is_for(url))
            .cloned()
    }

    /// Whatever the slot currently holds.
    pub fn current(&self) -> Option<CachedMetadataRecord> {
        self.slot.read().ok()?.clone()
    }

    /// Return the record for `url`, fetching it from the gateway on a miss.
    ///
    /// Returns `None` without touching the slot when the extension is not
    /// configured, the URL is not http(s), a precache fetch is not allowed,
    /// or the gateway fails. Failures are never cached.
    pub async fn refresh(
        &self,
        ctx: &ExtensionContext,
        url: &str,
        intent: FetchIntent,
    ) -> Option<CachedMetadataRecord> {
        if !ctx.configuration.is_complete() || !is_bookmarkable(url) {
            return None;
        }
        let gateway = ctx.gateway()?;

        if let Some(record) = self.lookup(url) {
            self.record(|stats| stats.hits += 1);
            return Some(record);
        }
        self.record(|stats| stats.misses += 1);

        if intent.is_precache() && !ctx.configuration.precache_enabled {
            self.record(|stats| stats.precache_skips += 1);
            tracing::debug!(url, "Precaching disabled, skipping metadata fetch");
            return None;
        }

        match fetch(gateway, url).await {
            Ok(response) => {
                let record = CachedMetadataRecord::from_check(url, response);
                self.store_slot(Some(record.clone())).await;
                Some(record)
            }
            Err(e) => {
                self.record(|stats| stats.gateway_failures += 1);
                tracing::warn!(error = %e, url, "Failed to load server metadata");
                None
            }
        }
    }

    /// Empty the slot so the next refresh refetches current truth.
    pub async fn clear(&self) {
        self.store_slot(None).await;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    /// Replace the slot, then persist it unless a newer write already has.
    async fn store_slot(&self, record: Option<CachedMetadataRecord>) {
        let sequence = {
            let Ok(mut slot) = self.slot.write() else {
                tracing::error!("Metadata cache lock poisoned");
                return;
            };
            let replaces_other_url = match (slot.as_ref(), record.as_ref()) {
                (Some(old), Some(new)) => old.requested_url != new.requested_url,
                _ => false,
            };
            if replaces_other_url {
                self.record(|stats| stats.evictions += 1);
            }
            *slot = record.clone();
            self.written.fetch_add(1, Ordering::SeqCst) + 1
        };

        let mut persisted = self.persisted.lock().await;
        if *persisted > sequence {
            tracing::debug!(sequence, "Newer metadata slot already persisted");
            return;
        }
        *persisted = sequence;
        if let Err(e) = write_json(
            self.store.as_ref(),
            SERVER_METADATA_CACHE_KEY,
            record.as_ref(),
        )
        .await
        {
            tracing::warn!(error = %e, "Failed to persist metadata cache slot");
        }
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}

/// Check a URL, completing trimmed bookmark summaries from older servers
/// with a single fetch by id.
async fn fetch(gateway: &dyn BookmarkGateway, url: &str) -> Result<CheckResponse, GatewayError> {
    let mut response = gateway.check_url(url).await?;
    if let Some(summary) = response.bookmark.as_ref().filter(|b| b.is_summary()) {
        tracing::debug!(bookmark_id = summary.id, "Check returned a summary, fetching full bookmark");
        response.bookmark = Some(gateway.get_bookmark(summary.id).await?);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use tabmark_core::ExtensionConfiguration;
    use tabmark_test_utils::fixtures::{bookmark, check_response, context_for, summary_bookmark};
    use std::sync::atomic::AtomicBool;
    use tabmark_test_utils::{FakeGateway, FlakyStore};

    const URL: &str = "https://example.com/";

    /// Store whose first write waits until released.
    #[derive(Default)]
    struct GatedStore {
        inner: InMemoryKeyValueStore,
        held: AtomicBool,
        waiting: AtomicBool,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for GatedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, tabmark_core::StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), tabmark_core::StorageError> {
            if !self.held.swap(true, Ordering::SeqCst) {
                self.waiting.store(true, Ordering::SeqCst);
                self.release.notified().await;
            }
            self.inner.set(key, value).await
        }
    }

    fn cache() -> (MetadataCache, Arc<InMemoryKeyValueStore>) {
        let store = Arc::new(InMemoryKeyValueStore::new());
        (MetadataCache::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_incomplete_configuration_never_calls_gateway() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = ExtensionContext::new(
            ExtensionConfiguration::new("https://links.test", ""),
            Some(gateway.clone()),
        );

        assert!(cache.refresh(&ctx, URL, FetchIntent::Explicit).await.is_none());
        assert_eq!(gateway.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_non_http_url_leaves_slot_untouched() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = context_for(gateway.clone(), true);

        cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        let before = cache.current();

        assert!(cache
            .refresh(&ctx, "chrome://extensions/", FetchIntent::Explicit)
            .await
            .is_none());
        assert_eq!(cache.current(), before);
        assert_eq!(gateway.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_hit_does_not_call_gateway() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = context_for(gateway.clone(), true);

        let first = cache.refresh(&ctx, URL, FetchIntent::Precache).await;
        let second = cache.refresh(&ctx, URL, FetchIntent::Precache).await;

        assert_eq!(first, second);
        assert_eq!(gateway.check_calls(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_single_slot_evicts_previous_url() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = context_for(gateway, true);
        let other = "https://other.example/";

        cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        let record = cache.refresh(&ctx, other, FetchIntent::Explicit).await;

        assert!(cache.lookup(URL).is_none());
        assert_eq!(cache.lookup(other), record);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_precache_skip_only_applies_to_precache_intent() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = context_for(gateway.clone(), false);

        assert!(cache.refresh(&ctx, URL, FetchIntent::Precache).await.is_none());
        assert_eq!(gateway.check_calls(), 0);
        assert!(cache.current().is_none());
        assert_eq!(cache.stats().precache_skips, 1);

        assert!(cache.refresh(&ctx, URL, FetchIntent::Explicit).await.is_some());
        assert_eq!(gateway.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_precache_disabled_still_serves_hits() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        let ctx = context_for(gateway.clone(), false);

        cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        assert!(cache.refresh(&ctx, URL, FetchIntent::Precache).await.is_some());
        assert_eq!(gateway.check_calls(), 1);
    }

    #[tokio::test]
    async fn test_summary_bookmark_is_completed_once() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_check(URL, check_response(URL, Some(summary_bookmark(7, URL))));
        gateway.add_bookmark(bookmark(7, URL));
        let ctx = context_for(gateway.clone(), true);

        let record = cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();

        assert_eq!(gateway.get_bookmark_calls(), 1);
        assert!(!record.bookmark.unwrap().is_summary());
    }

    #[tokio::test]
    async fn test_full_bookmark_needs_no_supplemental_fetch() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_check(URL, check_response(URL, Some(bookmark(7, URL))));
        let ctx = context_for(gateway.clone(), true);

        cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        assert_eq!(gateway.get_bookmark_calls(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_not_cached() {
        let (cache, _) = cache();
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_check_error(
            URL,
            GatewayError::UnexpectedStatus {
                endpoint: "/api/bookmarks/check/".to_string(),
                status: 500,
                message: "Internal Server Error".to_string(),
            },
        );
        let ctx = context_for(gateway.clone(), true);

        assert!(cache.refresh(&ctx, URL, FetchIntent::Explicit).await.is_none());
        assert!(cache.current().is_none());
        assert_eq!(cache.stats().gateway_failures, 1);

        gateway.clear_check_error(URL);
        assert!(cache.refresh(&ctx, URL, FetchIntent::Explicit).await.is_some());
        assert_eq!(gateway.check_calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_writes_null_sentinel() {
        let (cache, store) = cache();
        let ctx = context_for(Arc::new(FakeGateway::new()), true);

        cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        assert!(store.raw(SERVER_METADATA_CACHE_KEY).unwrap().contains(URL));

        cache.clear().await;
        assert!(cache.lookup(URL).is_none());
        assert_eq!(store.raw(SERVER_METADATA_CACHE_KEY).as_deref(), Some("null"));
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_slot() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let ctx = context_for(Arc::new(FakeGateway::new()), true);
        {
            let cache = MetadataCache::new(store.clone());
            cache.refresh(&ctx, URL, FetchIntent::Explicit).await.unwrap();
        }

        let restored = MetadataCache::restore(store).await;
        assert!(restored.lookup(URL).is_some());
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_quietly() {
        let store = Arc::new(FlakyStore::failing());
        let cache = MetadataCache::restore(store).await;
        let ctx = context_for(Arc::new(FakeGateway::new()), true);

        let record = cache.refresh(&ctx, URL, FetchIntent::Explicit).await;
        assert!(record.is_some());
        assert_eq!(cache.lookup(URL), record);

        cache.clear().await;
        assert!(cache.current().is_none());
    }
    #[tokio::test]
    async fn test_store_ends_on_latest_slot_when_writes_overlap() {
        let store = Arc::new(GatedStore::default());
        let cache = Arc::new(MetadataCache::new(store.clone()));
        let ctx = Arc::new(context_for(Arc::new(FakeGateway::new()), true));
        let older = "https://older.example/";
        let newer = "https://newer.example/";

        let first = {
            let (cache, ctx) = (cache.clone(), ctx.clone());
            tokio::spawn(async move { cache.refresh(&ctx, older, FetchIntent::Explicit).await })
        };
        while !store.waiting.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let second = {
            let (cache, ctx) = (cache.clone(), ctx.clone());
            tokio::spawn(async move { cache.refresh(&ctx, newer, FetchIntent::Explicit).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        store.release.notify_one();
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(cache.current().unwrap().requested_url, newer);
        let persisted: CachedMetadataRecord =
            serde_json::from_str(&store.inner.raw(SERVER_METADATA_CACHE_KEY).unwrap()).unwrap();
        assert_eq!(persisted.requested_url, newer);
    }
}
