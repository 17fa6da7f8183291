//! Navigation event coordinator.
//!
//! Turns tab lifecycle events into precache refreshes and badge updates.
//! Events are handled independently as they arrive; there is no queue and no
//! cancellation, so the last chain to finish decides the badge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabmark_core::{FetchIntent, TabId, TabIdentity};
use tabmark_storage::MetadataCache;

use crate::badge::BadgeStateMachine;
use crate::context::ContextProvider;
use crate::tabs::TabUrls;

/// A tab lifecycle event reported by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// The user switched to `tab`.
    Activated { tab: TabIdentity },
    /// `tab` changed; `url_changed` is false for title or loading updates.
    Updated {
        tab: TabIdentity,
        url_changed: bool,
        active: bool,
    },
    Created { tab: TabIdentity, active: bool },
    Removed { tab_id: TabId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The event is for a background tab.
    Inactive,
    /// The tab's URL has not changed since it was last seen.
    UrlUnchanged,
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    Ignored { reason: IgnoreReason },
    Refreshed { tab_id: TabId, bookmarked: bool },
    Forgotten { tab_id: TabId },
}

pub struct NavigationCoordinator {
    contexts: Arc<ContextProvider>,
    cache: Arc<MetadataCache>,
    badge: Arc<BadgeStateMachine>,
    tabs: Arc<TabUrls>,
}

impl NavigationCoordinator {
    pub fn new(
        contexts: Arc<ContextProvider>,
        cache: Arc<MetadataCache>,
        badge: Arc<BadgeStateMachine>,
    ) -> Self {
        Self {
            contexts,
            cache,
            tabs: badge.tabs(),
            badge,
        }
    }

    pub async fn handle(&self, event: NavigationEvent) -> NavigationOutcome {
        match event {
            NavigationEvent::Activated { tab } => {
                self.tabs.observe(&tab);
                self.refresh(&tab).await
            }
            NavigationEvent::Created { tab, active } => {
                if !active {
                    return ignored(IgnoreReason::Inactive);
                }
                self.tabs.observe(&tab);
                self.refresh(&tab).await
            }
            NavigationEvent::Updated {
                tab,
                url_changed,
                active,
            } => {
                if !active {
                    return ignored(IgnoreReason::Inactive);
                }
                if !url_changed || !self.tabs.observe(&tab) {
                    return ignored(IgnoreReason::UrlUnchanged);
                }
                self.refresh(&tab).await
            }
            NavigationEvent::Removed { tab_id } => {
                self.badge.forget(tab_id);
                NavigationOutcome::Forgotten { tab_id }
            }
        }
    }

    async fn refresh(&self, tab: &TabIdentity) -> NavigationOutcome {
        let ctx = self.contexts.current().await;
        let bookmarked = self
            .cache
            .refresh(&ctx, &tab.url, FetchIntent::Precache)
            .await
            .is_some_and(|record| record.is_bookmarked());

        tracing::debug!(tab_id = %tab.id, url = %tab.url, bookmarked, "Navigation refreshed");
        self.badge.apply_presence(tab.id, bookmarked).await;
        NavigationOutcome::Refreshed {
            tab_id: tab.id,
            bookmarked,
        }
    }
}

fn ignored(reason: IgnoreReason) -> NavigationOutcome {
    NavigationOutcome::Ignored { reason }
}
