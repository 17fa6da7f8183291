//! The URL each tab was last seen showing.

use std::collections::HashMap;
use std::sync::Mutex;

use tabmark_core::{TabId, TabIdentity};

#[derive(Debug, Default)]
pub struct TabUrls {
    urls: Mutex<HashMap<TabId, String>>,
}

impl TabUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tab's URL; false when it was already the last one seen.
    pub fn observe(&self, tab: &TabIdentity) -> bool {
        let Ok(mut urls) = self.urls.lock() else {
            return true;
        };
        match urls.insert(tab.id, tab.url.clone()) {
            Some(previous) => previous != tab.url,
            None => true,
        }
    }

    pub fn current(&self, tab_id: TabId) -> Option<String> {
        self.urls.lock().ok()?.get(&tab_id).cloned()
    }

    /// Whether `tab` still shows the URL it carried.
    pub fn still_shows(&self, tab: &TabIdentity) -> bool {
        self.current(tab.id).is_some_and(|url| url == tab.url)
    }

    pub fn forget(&self, tab_id: TabId) {
        if let Ok(mut urls) = self.urls.lock() {
            urls.remove(&tab_id);
        }
    }
}
