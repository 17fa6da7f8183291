//! Messages exchanged with the extension.
//!
//! Requests carry an `id` that the reply echoes. Badge, navigation and
//! notification commands are pushed without one.

use serde::{Deserialize, Serialize};

use tabmark_background::NavigationEvent;
use tabmark_core::{
    BadgeAppearance, BookmarkDraft, BookmarkId, Disposition, ExtensionConfiguration, TabId,
    TabIdentity,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: HostRequest,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    Navigation(NavigationEvent),
    PopupOpened {
        tab: TabIdentity,
    },
    SaveBookmark {
        tab: TabIdentity,
        bookmark: BookmarkDraft,
    },
    DeleteBookmark {
        tab: TabIdentity,
        bookmark_id: BookmarkId,
    },
    /// Context menu "Save bookmark" on a link.
    QuickSave {
        link_url: String,
    },
    OmniboxStarted,
    OmniboxChanged {
        text: String,
    },
    OmniboxEntered {
        content: String,
        disposition: Disposition,
    },
    /// Search engine result page asking for matching bookmarks.
    SearchPage {
        query: String,
    },
    GetConfiguration,
    SaveConfiguration {
        configuration: ExtensionConfiguration,
    },
    CacheStats,
}

impl HostRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Navigation(_) => "navigation",
            Self::PopupOpened { .. } => "popup_opened",
            Self::SaveBookmark { .. } => "save_bookmark",
            Self::DeleteBookmark { .. } => "delete_bookmark",
            Self::QuickSave { .. } => "quick_save",
            Self::OmniboxStarted => "omnibox_started",
            Self::OmniboxChanged { .. } => "omnibox_changed",
            Self::OmniboxEntered { .. } => "omnibox_entered",
            Self::SearchPage { .. } => "search_page",
            Self::GetConfiguration => "get_configuration",
            Self::SaveConfiguration { .. } => "save_configuration",
            Self::CacheStats => "cache_stats",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Response {
        id: Option<u64>,
        result: serde_json::Value,
    },
    Error {
        id: Option<u64>,
        message: String,
    },
    SetBadge {
        tab_id: TabId,
        badge: BadgeAppearance,
    },
    Navigate {
        url: String,
        disposition: Disposition,
    },
    Notification {
        title: String,
        message: String,
    },
}

impl HostMessage {
    pub fn response<T: Serialize>(id: Option<u64>, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self::Response { id, result },
            Err(e) => Self::Error {
                id,
                message: e.to_string(),
            },
        }
    }

    pub fn error(id: Option<u64>, message: impl Into<String>) -> Self {
        Self::Error {
            id,
            message: message.into(),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification {
            title: "Linkding".to_string(),
            message: message.into(),
        }
    }
}
