//! Entity types exchanged with the bookmark service and kept in the cache.

use crate::identity::{BookmarkId, Timestamp};
use serde::{Deserialize, Serialize};

/// A bookmark as stored by the remote service.
///
/// The host only ever holds a transient, possibly stale copy. Older servers
/// return a trimmed summary from the check endpoint, so every field other
/// than `id` and `url` tolerates absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub website_title: Option<String>,
    #[serde(default)]
    pub website_description: Option<String>,
    /// Display order is user-significant; semantically a set.
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub date_added: Option<Timestamp>,
    #[serde(default)]
    pub date_modified: Option<Timestamp>,
}

impl Bookmark {
    /// Whether this is a trimmed summary that a fetch-by-id would complete.
    ///
    /// Servers that predate full check responses omit `date_added`; its
    /// absence is the capability signal.
    pub fn is_summary(&self) -> bool {
        self.date_added.is_none()
    }

    /// Title shown to the user: bookmark title, then site title, then URL.
    pub fn display_title(&self) -> &str {
        non_empty(&self.title)
            .or_else(|| self.website_title.as_deref().and_then(non_empty))
            .unwrap_or(&self.url)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Payload for creating or updating a bookmark.
///
/// The service upserts on URL, so saving a draft for an already bookmarked
/// URL edits that bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookmarkDraft {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub unread: bool,
    #[serde(default)]
    pub shared: bool,
}

impl BookmarkDraft {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tag_names = tags;
        self
    }
}

/// Page metadata scraped by the service for a URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Response of the service's check-URL endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub bookmark: Option<Bookmark>,
    #[serde(default)]
    pub metadata: PageMetadata,
    /// Only sent by servers that support auto tagging.
    #[serde(default)]
    pub auto_tags: Option<Vec<String>>,
}

/// The single cached answer to "is this URL bookmarked?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMetadataRecord {
    pub requested_url: String,
    pub bookmark: Option<Bookmark>,
    pub metadata: PageMetadata,
    #[serde(default)]
    pub auto_tags: Option<Vec<String>>,
}

impl CachedMetadataRecord {
    pub fn from_check(requested_url: impl Into<String>, response: CheckResponse) -> Self {
        Self {
            requested_url: requested_url.into(),
            bookmark: response.bookmark,
            metadata: response.metadata,
            auto_tags: response.auto_tags,
        }
    }

    /// A record answers only for the exact URL it was requested for.
    pub fn is_for(&self, url: &str) -> bool {
        self.requested_url == url
    }

    pub fn is_bookmarked(&self) -> bool {
        self.bookmark.is_some()
    }
}

/// A tag known to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub date_added: Option<Timestamp>,
}

/// The user's profile settings relevant to the bookmark form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub enable_sharing: bool,
    #[serde(default)]
    pub enable_public_sharing: bool,
    #[serde(default)]
    pub enable_favicons: bool,
}

/// An omnibox suggestion: navigating to `content`, labelled `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub content: String,
    pub description: String,
}

impl From<&Bookmark> for Suggestion {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            content: bookmark.url.clone(),
            description: bookmark.display_title().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(url: &str) -> Bookmark {
        serde_json::from_value(serde_json::json!({ "id": 1, "url": url })).unwrap()
    }

    #[test]
    fn test_trimmed_check_bookmark_is_summary() {
        let bookmark = summary("https://example.com/");
        assert!(bookmark.is_summary());
        assert!(bookmark.tag_names.is_empty());
    }

    #[test]
    fn test_full_bookmark_is_not_summary() {
        let bookmark: Bookmark = serde_json::from_value(serde_json::json!({
            "id": 9,
            "url": "https://example.com/",
            "title": "Example",
            "tag_names": ["b", "a"],
            "date_added": "2024-03-01T10:00:00.123456Z",
        }))
        .unwrap();
        assert!(!bookmark.is_summary());
        assert_eq!(bookmark.tag_names, vec!["b", "a"]);
    }

    #[test]
    fn test_display_title_fallbacks() {
        let mut bookmark = summary("https://example.com/");
        assert_eq!(bookmark.display_title(), "https://example.com/");

        bookmark.website_title = Some("Site".to_string());
        assert_eq!(bookmark.display_title(), "Site");

        bookmark.title = "Mine".to_string();
        assert_eq!(bookmark.display_title(), "Mine");

        bookmark.title = "  ".to_string();
        bookmark.website_title = Some(String::new());
        assert_eq!(bookmark.display_title(), "https://example.com/");
    }

    #[test]
    fn test_check_response_without_auto_tags() {
        let response: CheckResponse = serde_json::from_value(serde_json::json!({
            "bookmark": null,
            "metadata": { "url": "https://example.com/", "title": "Example", "description": null },
        }))
        .unwrap();
        assert!(response.bookmark.is_none());
        assert!(response.auto_tags.is_none());
        assert_eq!(response.metadata.title.as_deref(), Some("Example"));
    }

    #[test]
    fn test_record_matches_only_requested_url() {
        let record = CachedMetadataRecord::from_check(
            "https://example.com/",
            CheckResponse {
                bookmark: None,
                metadata: PageMetadata::default(),
                auto_tags: None,
            },
        );
        assert!(record.is_for("https://example.com/"));
        assert!(!record.is_for("https://example.com"));
        assert!(!record.is_bookmarked());
    }
}
