//! tabmark Test Utilities
//!
//! Shared test infrastructure for the tabmark workspace:
//! - Scriptable fakes for the gateway, badge host and key-value store
//! - Proptest generators for URLs and entities
//! - Fixtures for common scenarios
//! - Assertions on badge history

pub use tabmark_core::{
    BadgeAppearance, BadgeError, BadgeHost, BadgeState, Bookmark, BookmarkDraft, BookmarkGateway,
    BookmarkId, CheckResponse, ExtensionConfiguration, ExtensionContext, GatewayError,
    GatewayFactory, KeyValueStore, PageMetadata, SaveOptions, SearchOptions, StorageError, TabId,
    Tag, UserProfile,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// FAKE GATEWAY
// ============================================================================

#[derive(Default)]
struct GatewayState {
    /// Server-side bookmarks, keyed by id.
    bookmarks: HashMap<BookmarkId, Bookmark>,
    next_id: BookmarkId,
    /// Scripted check responses that override the bookmark table.
    checks: HashMap<String, CheckResponse>,
    check_errors: HashMap<String, GatewayError>,
    check_delays: HashMap<String, Duration>,
    search_results: HashMap<String, Vec<Bookmark>>,
    search_delays: HashMap<String, Duration>,
    search_error: Option<GatewayError>,
    save_error: Option<GatewayError>,
    tags: Vec<Tag>,
    profile: Option<UserProfile>,
    saved: Vec<(BookmarkDraft, SaveOptions)>,
    deleted: Vec<BookmarkId>,
    searches: Vec<(String, SearchOptions)>,
}

/// In-process bookmark service.
///
/// Behaves like an upserting server over its own bookmark table: a save is
/// visible to the next check of the same URL. Responses, errors and delays
/// can be scripted per URL or query. Delays use `tokio::time::sleep`, so
/// tests with a paused clock control them exactly.
pub struct FakeGateway {
    state: Mutex<GatewayState>,
    connection_ok: AtomicBool,
    check_calls: AtomicUsize,
    get_bookmark_calls: AtomicUsize,
    search_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GatewayState {
                next_id: 1,
                ..Default::default()
            }),
            connection_ok: AtomicBool::new(true),
            check_calls: AtomicUsize::new(0),
            get_bookmark_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a bookmark to the server's table.
    pub fn add_bookmark(&self, bookmark: Bookmark) {
        let mut state = self.state();
        state.next_id = state.next_id.max(bookmark.id + 1);
        state.bookmarks.insert(bookmark.id, bookmark);
    }

    /// Answer checks of `url` with `response`, whatever the table holds.
    pub fn set_check(&self, url: &str, response: CheckResponse) {
        self.state().checks.insert(url.to_string(), response);
    }

    pub fn set_check_error(&self, url: &str, error: GatewayError) {
        self.state().check_errors.insert(url.to_string(), error);
    }

    pub fn clear_check_error(&self, url: &str) {
        self.state().check_errors.remove(url);
    }

    /// Delay every check of `url` by `delay` before answering.
    pub fn set_check_delay(&self, url: &str, delay: Duration) {
        self.state().check_delays.insert(url.to_string(), delay);
    }

    pub fn set_search_results(&self, text: &str, results: Vec<Bookmark>) {
        self.state().search_results.insert(text.to_string(), results);
    }

    pub fn set_search_delay(&self, text: &str, delay: Duration) {
        self.state().search_delays.insert(text.to_string(), delay);
    }

    pub fn set_search_error(&self, error: Option<GatewayError>) {
        self.state().search_error = error;
    }

    pub fn set_save_error(&self, error: Option<GatewayError>) {
        self.state().save_error = error;
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        self.state().tags = tags;
    }

    /// `None` makes the profile endpoint fail, like servers without it.
    pub fn set_profile(&self, profile: Option<UserProfile>) {
        self.state().profile = profile;
    }

    pub fn set_connection_ok(&self, ok: bool) {
        self.connection_ok.store(ok, Ordering::SeqCst);
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn get_bookmark_calls(&self) -> usize {
        self.get_bookmark_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Every draft saved so far, with its options.
    pub fn saved(&self) -> Vec<(BookmarkDraft, SaveOptions)> {
        self.state().saved.clone()
    }

    pub fn deleted(&self) -> Vec<BookmarkId> {
        self.state().deleted.clone()
    }

    pub fn searches(&self) -> Vec<(String, SearchOptions)> {
        self.state().searches.clone()
    }

    fn bookmark_for_url(state: &GatewayState, url: &str) -> Option<Bookmark> {
        state.bookmarks.values().find(|b| b.url == url).cloned()
    }
}

fn not_found(endpoint: String) -> GatewayError {
    GatewayError::UnexpectedStatus {
        endpoint,
        status: 404,
        message: "Not Found".to_string(),
    }
}

#[async_trait]
impl BookmarkGateway for FakeGateway {
    async fn check_url(&self, url: &str) -> Result<CheckResponse, GatewayError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.state().check_delays.get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(error) = state.check_errors.get(url) {
            return Err(error.clone());
        }
        if let Some(response) = state.checks.get(url) {
            return Ok(response.clone());
        }
        Ok(fixtures::check_response(
            url,
            Self::bookmark_for_url(&state, url),
        ))
    }

    async fn get_bookmark(&self, id: BookmarkId) -> Result<Bookmark, GatewayError> {
        self.get_bookmark_calls.fetch_add(1, Ordering::SeqCst);
        self.state()
            .bookmarks
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("/api/bookmarks/{id}/")))
    }

    async fn save_bookmark(
        &self,
        draft: &BookmarkDraft,
        options: SaveOptions,
    ) -> Result<Bookmark, GatewayError> {
        let mut state = self.state();
        if let Some(error) = state.save_error.clone() {
            return Err(error);
        }
        state.saved.push((draft.clone(), options));
        state.checks.remove(&draft.url);

        let id = match Self::bookmark_for_url(&state, &draft.url) {
            Some(existing) => existing.id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                id
            }
        };
        let now = chrono::Utc::now();
        let bookmark = Bookmark {
            id,
            url: draft.url.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            notes: draft.notes.clone(),
            website_title: None,
            website_description: None,
            tag_names: draft.tag_names.clone(),
            unread: draft.unread,
            shared: draft.shared,
            is_archived: false,
            date_added: Some(now),
            date_modified: Some(now),
        };
        state.bookmarks.insert(id, bookmark.clone());
        Ok(bookmark)
    }

    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), GatewayError> {
        let mut state = self.state();
        let removed = state
            .bookmarks
            .remove(&id)
            .ok_or_else(|| not_found(format!("/api/bookmarks/{id}/")))?;
        state.checks.remove(&removed.url);
        state.deleted.push(id);
        Ok(())
    }

    async fn search(
        &self,
        text: &str,
        options: SearchOptions,
    ) -> Result<Vec<Bookmark>, GatewayError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = {
            let mut state = self.state();
            state.searches.push((text.to_string(), options));
            state.search_delays.get(text).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(error) = state.search_error.clone() {
            return Err(error);
        }
        let mut results = state.search_results.get(text).cloned().unwrap_or_default();
        results.truncate(options.limit);
        Ok(results)
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, GatewayError> {
        Ok(self.state().tags.clone())
    }

    async fn get_user_profile(&self) -> Result<UserProfile, GatewayError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.state()
            .profile
            .clone()
            .ok_or_else(|| not_found("/api/user/profile/".to_string()))
    }

    async fn test_connection(&self) -> bool {
        self.connection_ok.load(Ordering::SeqCst)
    }
}

/// Hands out one shared [`FakeGateway`] for every complete configuration.
pub struct FakeGatewayFactory {
    gateway: Arc<FakeGateway>,
    connects: AtomicUsize,
}

impl FakeGatewayFactory {
    pub fn new(gateway: Arc<FakeGateway>) -> Self {
        Self {
            gateway,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn gateway(&self) -> Arc<FakeGateway> {
        self.gateway.clone()
    }

    /// How many gateways have been built.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl GatewayFactory for FakeGatewayFactory {
    fn connect(
        &self,
        _configuration: &ExtensionConfiguration,
    ) -> Result<Arc<dyn BookmarkGateway>, GatewayError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.gateway.clone())
    }
}

// ============================================================================
// RECORDING BADGE HOST
// ============================================================================

/// Badge host that remembers every write.
#[derive(Debug, Default)]
pub struct RecordingBadgeHost {
    current: Mutex<HashMap<TabId, BadgeAppearance>>,
    history: Mutex<Vec<(TabId, BadgeAppearance)>>,
    fail: AtomicBool,
}

impl RecordingBadgeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every host call fail, as for a closed tab.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Visible state of a tab, `Empty` when never written.
    pub fn state(&self, tab_id: TabId) -> BadgeState {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&tab_id)
            .map(|appearance| BadgeAppearance::state_of_text(&appearance.text))
            .unwrap_or_default()
    }

    /// States written to one tab, oldest first.
    pub fn states_for(&self, tab_id: TabId) -> Vec<BadgeState> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|(id, _)| *id == tab_id)
            .map(|(_, appearance)| BadgeAppearance::state_of_text(&appearance.text))
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.history.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    fn check_available(&self) -> Result<(), BadgeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BadgeError::Unavailable {
                reason: "No tab with given id".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BadgeHost for RecordingBadgeHost {
    async fn set_badge(
        &self,
        tab_id: TabId,
        appearance: &BadgeAppearance,
    ) -> Result<(), BadgeError> {
        self.check_available()?;
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(tab_id, appearance.clone());
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((tab_id, appearance.clone()));
        Ok(())
    }

    async fn badge_text(&self, tab_id: TabId) -> Result<String, BadgeError> {
        self.check_available()?;
        Ok(self
            .current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&tab_id)
            .map(|appearance| appearance.text.clone())
            .unwrap_or_default())
    }
}

// ============================================================================
// FLAKY STORE
// ============================================================================

/// In-memory store whose reads and writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where everything fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_reads(true);
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                reason: "injected read failure".to_string(),
            });
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "injected write failure".to_string(),
            });
        }
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for URLs and entities.

    use super::*;
    use proptest::prelude::*;

    /// An http(s) URL with a short host and path.
    pub fn arb_http_url() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("http"), Just("https")],
            "[a-z]{1,12}",
            prop_oneof![Just("com"), Just("org"), Just("dev")],
            "[a-z0-9/]{0,16}",
        )
            .prop_map(|(scheme, host, tld, path)| format!("{scheme}://{host}.{tld}/{path}"))
    }

    /// A URL that can never be bookmarked.
    pub fn arb_non_http_url() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("chrome://newtab/".to_string()),
            Just("about:blank".to_string()),
            Just("about:newtab".to_string()),
            "[a-z]{1,10}".prop_map(|path| format!("file:///{path}")),
            "[a-z]{1,10}".prop_map(|id| format!("chrome-extension://{id}/popup.html")),
            "[a-z]{1,10}".prop_map(|host| format!("ftp://{host}.org/")),
        ]
    }

    pub fn arb_tag_names() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z]{1,8}", 0..5)
    }

    /// A bookmark with a full set of server fields.
    pub fn arb_bookmark() -> impl Strategy<Value = Bookmark> {
        (1i64..10_000, arb_http_url(), "[A-Za-z ]{0,24}", arb_tag_names()).prop_map(
            |(id, url, title, tags)| {
                let mut bookmark = fixtures::bookmark(id, &url);
                bookmark.title = title;
                bookmark.tag_names = tags;
                bookmark
            },
        )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built values for common scenarios.

    use super::*;

    pub const BASE_URL: &str = "https://links.example.org";
    pub const TOKEN: &str = "test-token";

    /// A complete configuration pointing at [`BASE_URL`].
    pub fn complete_configuration(precache_enabled: bool) -> ExtensionConfiguration {
        ExtensionConfiguration::new(BASE_URL, TOKEN).with_precache(precache_enabled)
    }

    /// A ready context whose gateway is `gateway`.
    pub fn context_for(gateway: Arc<FakeGateway>, precache_enabled: bool) -> ExtensionContext {
        ExtensionContext::new(complete_configuration(precache_enabled), Some(gateway))
    }

    /// A full bookmark, as returned by current servers.
    pub fn bookmark(id: BookmarkId, url: &str) -> Bookmark {
        let added = chrono::DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .map(|t| t.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now());
        Bookmark {
            id,
            url: url.to_string(),
            title: format!("Bookmark {id}"),
            description: String::new(),
            notes: String::new(),
            website_title: None,
            website_description: None,
            tag_names: vec!["reading".to_string()],
            unread: false,
            shared: false,
            is_archived: false,
            date_added: Some(added),
            date_modified: Some(added),
        }
    }

    /// The trimmed bookmark older servers return from the check endpoint.
    pub fn summary_bookmark(id: BookmarkId, url: &str) -> Bookmark {
        Bookmark {
            date_added: None,
            date_modified: None,
            ..bookmark(id, url)
        }
    }

    pub fn check_response(url: &str, bookmark: Option<Bookmark>) -> CheckResponse {
        CheckResponse {
            bookmark,
            metadata: PageMetadata {
                url: Some(url.to_string()),
                title: Some(format!("Title of {url}")),
                description: None,
            },
            auto_tags: None,
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on badge history.

    use super::*;

    /// Assert the badge of `tab_id` currently shows `expected`.
    #[track_caller]
    pub fn assert_badge(host: &RecordingBadgeHost, tab_id: TabId, expected: BadgeState) {
        let actual = host.state(tab_id);
        assert_eq!(
            actual, expected,
            "Expected badge of {tab_id} to be {expected:?}, got {actual:?}"
        );
    }

    /// Assert the exact sequence of states written to `tab_id`.
    #[track_caller]
    pub fn assert_badge_history(host: &RecordingBadgeHost, tab_id: TabId, expected: &[BadgeState]) {
        assert_eq!(
            host.states_for(tab_id),
            expected,
            "Unexpected badge history for {tab_id}"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_saved_bookmark_is_visible_to_check() {
        let gateway = FakeGateway::new();
        let url = "https://example.com/";
        assert!(gateway.check_url(url).await.unwrap().bookmark.is_none());

        let saved = gateway
            .save_bookmark(&BookmarkDraft::new(url), SaveOptions::default())
            .await
            .unwrap();
        let checked = gateway.check_url(url).await.unwrap();
        assert_eq!(checked.bookmark.map(|b| b.id), Some(saved.id));
        assert_eq!(gateway.check_calls(), 2);
    }

    #[tokio::test]
    async fn test_save_upserts_on_url() {
        let gateway = FakeGateway::new();
        gateway.add_bookmark(fixtures::bookmark(41, "https://example.com/"));

        let saved = gateway
            .save_bookmark(
                &BookmarkDraft::new("https://example.com/").with_title("Edited"),
                SaveOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(saved.id, 41);
        assert_eq!(gateway.get_bookmark(41).await.unwrap().title, "Edited");
    }

    #[tokio::test]
    async fn test_delete_unknown_bookmark_fails() {
        let gateway = FakeGateway::new();
        assert!(gateway.delete_bookmark(3).await.is_err());
        assert!(gateway.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_recording_host_history() {
        let host = RecordingBadgeHost::new();
        let tab = TabId::new(1);
        host.set_badge(tab, &BadgeAppearance::for_state(BadgeState::Bookmarked))
            .await
            .unwrap();
        host.set_badge(tab, &BadgeAppearance::for_state(BadgeState::Empty))
            .await
            .unwrap();

        assertions::assert_badge(&host, tab, BadgeState::Empty);
        assertions::assert_badge_history(&host, tab, &[BadgeState::Bookmarked, BadgeState::Empty]);
        assertions::assert_badge(&host, TabId::new(2), BadgeState::Empty);
    }

    #[tokio::test]
    async fn test_flaky_store_injects_failures() {
        let store = FlakyStore::new();
        store.set("k", "v").await.unwrap();
        store.set_fail_reads(true);
        assert!(store.get("k").await.is_err());
        store.set_fail_reads(false);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    proptest! {
        #[test]
        fn prop_generated_urls_are_classified(
            http in generators::arb_http_url(),
            other in generators::arb_non_http_url(),
        ) {
            prop_assert!(tabmark_core::is_bookmarkable(&http));
            prop_assert!(!tabmark_core::is_bookmarkable(&other));
        }
    }
}
