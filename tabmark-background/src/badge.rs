//! Per-tab badge state machine.
//!
//! ```text
//!             confirmed presence
//!   Empty  ──────────────────────▶  Bookmarked
//!     ▲    ◀──────────────────────    │
//!     │        confirmed absence      │
//!     │                               │
//!     └─── settle, not confirmed ── SavedPulse ◀── save succeeded (any state)
//!                                     │
//!                settle, confirmed ───┘──▶ Bookmarked
//! ```
//!
//! Every write is scoped to one tab. Concurrent chains for the same tab are
//! not ordered: the last write wins. A pulse only settles while the tab still
//! shows the URL that was saved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tabmark_core::{
    BadgeAppearance, BadgeHost, BadgeState, ExtensionContext, FetchIntent, TabId, TabIdentity,
};
use tabmark_storage::MetadataCache;

use crate::tabs::TabUrls;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

pub struct BadgeStateMachine {
    host: Arc<dyn BadgeHost>,
    cache: Arc<MetadataCache>,
    settle_delay: Duration,
    tabs: Arc<TabUrls>,
    /// Last state written per tab.
    states: Mutex<HashMap<TabId, BadgeState>>,
}

impl BadgeStateMachine {
    pub fn new(host: Arc<dyn BadgeHost>, cache: Arc<MetadataCache>) -> Self {
        Self::with_settle_delay(host, cache, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_settle_delay(
        host: Arc<dyn BadgeHost>,
        cache: Arc<MetadataCache>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            host,
            cache,
            settle_delay,
            tabs: Arc::new(TabUrls::new()),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// URLs the tabs are showing, shared with the navigation coordinator.
    pub fn tabs(&self) -> Arc<TabUrls> {
        self.tabs.clone()
    }

    /// Show whether the tab's URL is bookmarked.
    pub async fn apply_presence(&self, tab_id: TabId, bookmarked: bool) -> BadgeState {
        let target = if bookmarked {
            BadgeState::Bookmarked
        } else {
            BadgeState::Empty
        };
        self.transition(tab_id, target).await
    }

    /// Pulse the saved badge, then settle on whatever the service reports.
    ///
    /// The caller must have cleared the metadata cache, so the settle check
    /// sees the bookmark that was just saved. If the tab navigated away or
    /// closed during the delay, the pulse neither refreshes nor writes.
    pub async fn pulse_saved(&self, tab: &TabIdentity, ctx: &ExtensionContext) -> BadgeState {
        self.tabs.observe(tab);
        self.transition(tab.id, BadgeState::SavedPulse).await;
        tokio::time::sleep(self.settle_delay).await;

        if !self.tabs.still_shows(tab) {
            tracing::debug!(tab_id = %tab.id, url = %tab.url, "Tab left saved page, pulse abandoned");
            return self.state(tab.id);
        }

        let confirmed = self
            .cache
            .refresh(ctx, &tab.url, FetchIntent::Explicit)
            .await
            .is_some_and(|record| record.is_bookmarked());
        if !self.tabs.still_shows(tab) {
            return self.state(tab.id);
        }
        tracing::debug!(tab_id = %tab.id, confirmed, "Saved badge settled");
        self.apply_presence(tab.id, confirmed).await
    }

    /// Last state written to a tab.
    pub fn state(&self, tab_id: TabId) -> BadgeState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(&tab_id).copied())
            .unwrap_or_default()
    }

    /// Drop the state of a closed tab.
    pub fn forget(&self, tab_id: TabId) {
        self.tabs.forget(tab_id);
        if let Ok(mut states) = self.states.lock() {
            states.remove(&tab_id);
        }
    }

    async fn transition(&self, tab_id: TabId, target: BadgeState) -> BadgeState {
        let shown = match self.host.badge_text(tab_id).await {
            Ok(text) => BadgeAppearance::state_of_text(&text),
            Err(e) => {
                tracing::debug!(error = %e, %tab_id, "Badge text unavailable");
                self.state(tab_id)
            }
        };

        if shown != target {
            let appearance = BadgeAppearance::for_state(target);
            if let Err(e) = self.host.set_badge(tab_id, &appearance).await {
                tracing::warn!(error = %e, %tab_id, state = ?target, "Failed to set badge");
                return shown;
            }
        }

        if let Ok(mut states) = self.states.lock() {
            states.insert(tab_id, target);
        }
        target
    }
}
