//! tabmark Background - Event Handling for the Bookmark Companion
//!
//! Everything the extension's background page does, minus the browser APIs:
//! navigation precaching, per-tab badges, omnibox suggestions and the
//! bookmark actions behind the popup and context menu. Browser calls go
//! through the `BadgeHost` trait; the bookmark service through
//! `BookmarkGateway`.

pub mod actions;
pub mod badge;
pub mod context;
pub mod coordinator;
pub mod omnibox;
pub mod tabs;

pub use actions::{BookmarkActions, PopupPrefill, PopupView, QuickSaveOutcome, SaveOutcome};
pub use badge::{BadgeStateMachine, DEFAULT_SETTLE_DELAY};
pub use context::ContextProvider;
pub use coordinator::{IgnoreReason, NavigationCoordinator, NavigationEvent, NavigationOutcome};
pub use omnibox::{OmniboxAdapter, OmniboxNavigation, QueryResult};
pub use tabs::TabUrls;

use std::sync::Arc;
use std::time::Duration;

use tabmark_core::{BadgeHost, GatewayFactory, KeyValueStore};
use tabmark_storage::{MetadataCache, ProfileCache};

/// Tunables for [`BackgroundServices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundOptions {
    pub settle_delay: Duration,
    pub omnibox_limit: usize,
    pub omnibox_debounce: Duration,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            omnibox_limit: omnibox::DEFAULT_SUGGESTION_LIMIT,
            omnibox_debounce: omnibox::DEFAULT_DEBOUNCE,
        }
    }
}

/// All background components, wired to one store, gateway factory and host.
pub struct BackgroundServices {
    pub contexts: Arc<ContextProvider>,
    pub cache: Arc<MetadataCache>,
    pub badge: Arc<BadgeStateMachine>,
    pub coordinator: NavigationCoordinator,
    pub omnibox: OmniboxAdapter,
    pub actions: BookmarkActions,
}

impl BackgroundServices {
    /// Wire the components, restoring the cache slot from `store`.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        factory: Arc<dyn GatewayFactory>,
        host: Arc<dyn BadgeHost>,
        options: BackgroundOptions,
    ) -> Self {
        let contexts = Arc::new(ContextProvider::new(store.clone(), factory));
        let cache = Arc::new(MetadataCache::restore(store.clone()).await);
        let profiles = Arc::new(ProfileCache::new(store));
        let badge = Arc::new(BadgeStateMachine::with_settle_delay(
            host,
            cache.clone(),
            options.settle_delay,
        ));

        Self {
            coordinator: NavigationCoordinator::new(contexts.clone(), cache.clone(), badge.clone()),
            omnibox: OmniboxAdapter::new(options.omnibox_limit, options.omnibox_debounce),
            actions: BookmarkActions::new(contexts.clone(), cache.clone(), profiles, badge.clone()),
            contexts,
            cache,
            badge,
        }
    }
}
