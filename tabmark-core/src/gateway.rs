//! Contract of the remote bookmark service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ExtensionConfiguration;
use crate::entities::{Bookmark, BookmarkDraft, CheckResponse, Tag, UserProfile};
use crate::error::GatewayError;
use crate::identity::BookmarkId;

/// Options passed along with a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveOptions {
    /// Skip the server-side HTML snapshot (a local snapshot tool runs instead).
    pub disable_html_snapshot: bool,
}

/// Options for a bookmark search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { limit: 100 }
    }
}

impl SearchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

/// The remote bookmark service.
///
/// Every non-success response surfaces as a [`GatewayError`]; callers in the
/// background paths log it and degrade to "no update".
#[async_trait]
pub trait BookmarkGateway: Send + Sync {
    /// Bookmark existence and scraped page metadata for a URL.
    async fn check_url(&self, url: &str) -> Result<CheckResponse, GatewayError>;

    /// Fetch a full bookmark by id.
    async fn get_bookmark(&self, id: BookmarkId) -> Result<Bookmark, GatewayError>;

    /// Create a bookmark, or update the existing one for the same URL.
    async fn save_bookmark(
        &self,
        draft: &BookmarkDraft,
        options: SaveOptions,
    ) -> Result<Bookmark, GatewayError>;

    /// Delete a bookmark by id.
    async fn delete_bookmark(&self, id: BookmarkId) -> Result<(), GatewayError>;

    /// Full-text search over bookmarks.
    async fn search(
        &self,
        text: &str,
        options: SearchOptions,
    ) -> Result<Vec<Bookmark>, GatewayError>;

    /// All tags known to the service.
    async fn get_tags(&self) -> Result<Vec<Tag>, GatewayError>;

    /// The user's profile; servers without the endpoint return an error.
    async fn get_user_profile(&self) -> Result<UserProfile, GatewayError>;

    /// Whether the configured base URL and token reach a working service.
    async fn test_connection(&self) -> bool;
}

/// Builds gateway clients from a configuration snapshot.
pub trait GatewayFactory: Send + Sync {
    fn connect(
        &self,
        configuration: &ExtensionConfiguration,
    ) -> Result<Arc<dyn BookmarkGateway>, GatewayError>;
}
