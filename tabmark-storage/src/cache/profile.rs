//! Cached user profile.

use std::sync::Arc;

use tabmark_core::{read_json, write_json, ExtensionContext, KeyValueStore, UserProfile, PROFILE_CACHE_KEY};

/// Last known user profile, persisted under [`PROFILE_CACHE_KEY`].
///
/// Servers without the profile endpoint never produce one; callers treat
/// `None` as "sharing options unknown" and hide them.
pub struct ProfileCache {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The profile stored by the last successful update.
    pub async fn cached(&self) -> Option<UserProfile> {
        read_json(self.store.as_ref(), PROFILE_CACHE_KEY)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read cached profile");
                None
            })
    }

    /// Fetch the profile and store it.
    ///
    /// A failed fetch keeps whatever was cached before and returns `None`.
    pub async fn update(&self, ctx: &ExtensionContext) -> Option<UserProfile> {
        let gateway = ctx.gateway()?;
        let profile = match gateway.get_user_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::debug!(error = %e, "User profile unavailable");
                return None;
            }
        };
        if let Err(e) = write_json(self.store.as_ref(), PROFILE_CACHE_KEY, Some(&profile)).await {
            tracing::warn!(error = %e, "Failed to store user profile");
        }
        Some(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use tabmark_test_utils::fixtures::context_for;
    use tabmark_test_utils::FakeGateway;

    #[tokio::test]
    async fn test_update_stores_profile() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cache = ProfileCache::new(store.clone());
        let gateway = Arc::new(FakeGateway::new());
        let profile = UserProfile {
            enable_sharing: true,
            ..Default::default()
        };
        gateway.set_profile(Some(profile.clone()));

        assert_eq!(cache.update(&context_for(gateway, false)).await, Some(profile.clone()));
        assert_eq!(cache.cached().await, Some(profile));
    }

    #[tokio::test]
    async fn test_missing_endpoint_keeps_previous_profile() {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let cache = ProfileCache::new(store);
        let gateway = Arc::new(FakeGateway::new());
        gateway.set_profile(Some(UserProfile::default()));
        let ctx = context_for(gateway.clone(), false);
        cache.update(&ctx).await;

        gateway.set_profile(None);
        assert!(cache.update(&ctx).await.is_none());
        assert_eq!(cache.cached().await, Some(UserProfile::default()));
    }

    #[tokio::test]
    async fn test_unconfigured_context_skips_fetch() {
        let cache = ProfileCache::new(Arc::new(InMemoryKeyValueStore::new()));
        let gateway = Arc::new(FakeGateway::new());
        let ctx = ExtensionContext::unconfigured(Default::default());

        assert!(cache.update(&ctx).await.is_none());
        assert_eq!(gateway.profile_calls(), 0);
    }
}
