//! Omnibox suggestions backed by bookmark search.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabmark_core::{
    is_bookmarkable, Bookmark, Disposition, ExtensionContext, SearchOptions, Suggestion,
};

pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

const READY_DESCRIPTION: &str = "Search bookmarks in linkding";
const NOT_CONFIGURED_DESCRIPTION: &str = "⚠️ Please configure the linkding extension first";

/// Result of one input change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "suggestions", rename_all = "snake_case")]
pub enum QueryResult {
    Suggestions(Vec<Suggestion>),
    /// Newer input arrived before this query finished; show nothing.
    Superseded,
}

/// Where to send the browser when the user accepts the omnibox input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmniboxNavigation {
    pub url: String,
    pub disposition: Disposition,
}

/// Each input change takes a generation number. Only the newest generation's
/// results are shown.
pub struct OmniboxAdapter {
    generation: AtomicU64,
    limit: usize,
    debounce: Duration,
}

impl Default for OmniboxAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_SUGGESTION_LIMIT, DEFAULT_DEBOUNCE)
    }
}

impl OmniboxAdapter {
    pub fn new(limit: usize, debounce: Duration) -> Self {
        Self {
            generation: AtomicU64::new(0),
            limit,
            debounce,
        }
    }

    /// Text for the default suggestion row.
    pub fn on_input_started(&self, ctx: &ExtensionContext) -> &'static str {
        if ctx.is_ready() {
            READY_DESCRIPTION
        } else {
            NOT_CONFIGURED_DESCRIPTION
        }
    }

    pub async fn on_input_changed(&self, ctx: &ExtensionContext, text: &str) -> QueryResult {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if self.is_superseded(generation) {
            return QueryResult::Superseded;
        }

        let Some(gateway) = ctx.gateway() else {
            return QueryResult::Suggestions(Vec::new());
        };
        if text.trim().is_empty() {
            return QueryResult::Suggestions(Vec::new());
        }

        let results = gateway
            .search(text, SearchOptions::with_limit(self.limit))
            .await;
        if self.is_superseded(generation) {
            tracing::trace!(generation, "Discarding superseded omnibox results");
            return QueryResult::Superseded;
        }

        match results {
            Ok(bookmarks) => QueryResult::Suggestions(
                bookmarks.iter().take(self.limit).map(Suggestion::from).collect(),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Omnibox search failed");
                QueryResult::Suggestions(Vec::new())
            }
        }
    }

    /// Resolve accepted input to a navigation.
    ///
    /// URLs open directly; anything else opens the service's search page.
    /// `None` when unconfigured or the input is empty.
    pub fn on_input_entered(
        &self,
        ctx: &ExtensionContext,
        content: &str,
        disposition: Disposition,
    ) -> Option<OmniboxNavigation> {
        if !ctx.configuration.is_complete() || content.is_empty() {
            return None;
        }
        let url = if is_bookmarkable(content) {
            content.to_string()
        } else {
            format!(
                "{}/bookmarks?q={}",
                ctx.configuration.api_base(),
                urlencoding::encode(content)
            )
        };
        Some(OmniboxNavigation { url, disposition })
    }

    /// Bookmarks matching a search engine query, for result page injection.
    pub async fn search_page_results(&self, ctx: &ExtensionContext, query: &str) -> Vec<Bookmark> {
        let Some(gateway) = ctx.gateway() else {
            return Vec::new();
        };
        if query.trim().is_empty() {
            return Vec::new();
        }
        gateway
            .search(query, SearchOptions::default())
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Search page lookup failed");
                Vec::new()
            })
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}
