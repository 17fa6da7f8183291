//! User-initiated bookmark actions: the add/edit popup, context menu quick
//! save, and deleting from the popup.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabmark_core::{
    is_new_tab_page, Bookmark, BookmarkDraft, BookmarkId, ExtensionContext, FetchIntent,
    SaveOptions, TabIdentity, TabmarkResult, UserProfile,
};
use tabmark_storage::{MetadataCache, ProfileCache};

use crate::badge::BadgeStateMachine;
use crate::context::ContextProvider;

/// What the popup should show for a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PopupView {
    /// New tab page: go to the bookmark list instead of showing a form.
    Redirect { url: String },
    /// No base URL or token yet.
    NotConfigured,
    Form(PopupPrefill),
}

/// Initial values of the add/edit bookmark form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopupPrefill {
    pub url: String,
    pub title: String,
    /// Shown as placeholders when the title or description are empty.
    pub title_placeholder: String,
    pub description_placeholder: String,
    pub description: String,
    pub notes: String,
    pub tag_names: Vec<String>,
    pub unread: bool,
    pub shared: bool,
    /// Set when the URL is already bookmarked; saving edits that bookmark.
    pub existing_bookmark_id: Option<BookmarkId>,
    /// Tags the server will add on save. Only offered for new bookmarks.
    pub auto_tags: Vec<String>,
    pub available_tags: Vec<String>,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOutcome {
    pub bookmark: Bookmark,
    /// Close the popup this many milliseconds after saving.
    pub close_after_ms: Option<u64>,
    /// Take a local page snapshot; only for newly created bookmarks.
    pub run_singlefile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QuickSaveOutcome {
    NotConfigured,
    /// The link could not be checked (not http(s), or the service failed).
    Unavailable,
    AlreadySaved,
    Saved { bookmark: Bookmark },
    Failed { message: String },
}

pub struct BookmarkActions {
    contexts: Arc<ContextProvider>,
    cache: Arc<MetadataCache>,
    profiles: Arc<ProfileCache>,
    badge: Arc<BadgeStateMachine>,
}

impl BookmarkActions {
    pub fn new(
        contexts: Arc<ContextProvider>,
        cache: Arc<MetadataCache>,
        profiles: Arc<ProfileCache>,
        badge: Arc<BadgeStateMachine>,
    ) -> Self {
        Self {
            contexts,
            cache,
            profiles,
            badge,
        }
    }

    pub async fn prepare_popup(&self, tab: &TabIdentity) -> PopupView {
        let ctx = self.contexts.current().await;
        let configuration = &ctx.configuration;

        if is_new_tab_page(&tab.url) && !configuration.base_url.trim().is_empty() {
            return PopupView::Redirect {
                url: format!("{}/bookmarks", configuration.api_base()),
            };
        }
        if !ctx.is_ready() {
            return PopupView::NotConfigured;
        }

        let record = self.cache.refresh(&ctx, &tab.url, FetchIntent::Explicit).await;
        let profile = match self.profiles.update(&ctx).await {
            Some(profile) => Some(profile),
            None => self.profiles.cached().await,
        };
        let available_tags = available_tags(&ctx).await;

        let metadata = record.as_ref().map(|r| r.metadata.clone()).unwrap_or_default();
        let (title, description) = if configuration.use_browser_metadata {
            (tab.title.clone(), String::new())
        } else {
            (
                metadata.title.clone().unwrap_or_default(),
                metadata.description.clone().unwrap_or_default(),
            )
        };
        let mut prefill = PopupPrefill {
            url: tab.url.clone(),
            title,
            title_placeholder: metadata.title.unwrap_or_default(),
            description_placeholder: metadata.description.unwrap_or_default(),
            description,
            notes: String::new(),
            tag_names: configuration.default_tag_names(),
            unread: configuration.unread_selected,
            shared: configuration.share_selected,
            existing_bookmark_id: None,
            auto_tags: Vec::new(),
            available_tags,
            profile,
        };

        let (existing, auto_tags) = record
            .map(|r| (r.bookmark, r.auto_tags))
            .unwrap_or_default();
        match existing {
            Some(existing) => {
                prefill.title = existing.title;
                prefill.description = existing.description;
                prefill.notes = existing.notes;
                prefill.tag_names = existing.tag_names;
                prefill.unread = existing.unread;
                prefill.shared = existing.shared;
                prefill.existing_bookmark_id = Some(existing.id);
            }
            None => prefill.auto_tags = auto_tags.unwrap_or_default(),
        }
        PopupView::Form(prefill)
    }

    /// Create or update the bookmark for `tab`, then pulse its badge.
    ///
    /// The badge pulse runs on its own task and settles in the background.
    pub async fn save(&self, tab: &TabIdentity, draft: BookmarkDraft) -> TabmarkResult<SaveOutcome> {
        let ctx = self.contexts.current().await;
        let gateway = ctx.require_gateway()?;
        let is_new = !self
            .cache
            .lookup(&draft.url)
            .is_some_and(|record| record.is_bookmarked());

        let options = SaveOptions {
            disable_html_snapshot: ctx.configuration.run_singlefile,
        };
        let bookmark = gateway.save_bookmark(&draft, options).await?;
        tracing::info!(bookmark_id = bookmark.id, tab_id = %tab.id, "Saved bookmark");

        self.cache.clear().await;
        self.spawn_pulse(tab.clone(), ctx.clone());

        Ok(SaveOutcome {
            bookmark,
            close_after_ms: ctx.configuration.close_on_save_ms(),
            run_singlefile: is_new && ctx.configuration.run_singlefile,
        })
    }

    pub async fn delete(&self, tab: &TabIdentity, id: BookmarkId) -> TabmarkResult<()> {
        let ctx = self.contexts.current().await;
        ctx.require_gateway()?.delete_bookmark(id).await?;
        tracing::info!(bookmark_id = id, tab_id = %tab.id, "Deleted bookmark");

        self.cache.clear().await;
        self.badge.apply_presence(tab.id, false).await;
        Ok(())
    }

    /// Save a link from the context menu with default tags.
    pub async fn quick_save_link(&self, link_url: &str) -> QuickSaveOutcome {
        let ctx = self.contexts.current().await;
        let Some(gateway) = ctx.gateway() else {
            return QuickSaveOutcome::NotConfigured;
        };
        let Some(record) = self.cache.refresh(&ctx, link_url, FetchIntent::Explicit).await else {
            return QuickSaveOutcome::Unavailable;
        };
        if record.is_bookmarked() {
            return QuickSaveOutcome::AlreadySaved;
        }

        let metadata = record.metadata;
        let draft = BookmarkDraft::new(metadata.url.unwrap_or_else(|| link_url.to_string()))
            .with_title(metadata.title.unwrap_or_default())
            .with_description(metadata.description.unwrap_or_default())
            .with_tags(ctx.configuration.default_tag_names());

        match gateway.save_bookmark(&draft, SaveOptions::default()).await {
            Ok(bookmark) => {
                self.cache.clear().await;
                tracing::info!(bookmark_id = bookmark.id, "Saved link from context menu");
                QuickSaveOutcome::Saved { bookmark }
            }
            Err(e) => {
                tracing::warn!(error = %e, url = link_url, "Quick save failed");
                QuickSaveOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn spawn_pulse(&self, tab: TabIdentity, ctx: Arc<ExtensionContext>) {
        let badge = self.badge.clone();
        tokio::spawn(async move {
            badge.pulse_saved(&tab, &ctx).await;
        });
    }
}

async fn available_tags(ctx: &ExtensionContext) -> Vec<String> {
    let Some(gateway) = ctx.gateway() else {
        return Vec::new();
    };
    match gateway.get_tags().await {
        Ok(tags) => tags.into_iter().map(|tag| tag.name).collect(),
        Err(e) => {
            tracing::debug!(error = %e, "Tag list unavailable");
            Vec::new()
        }
    }
}
