//! tabmark Core - Entity Types and Collaborator Contracts
//!
//! Data structures shared by every tabmark crate, plus the traits for the
//! collaborators the caching subsystem talks to: the remote bookmark gateway,
//! the key-value store and the host badge API. No business logic lives here.

pub mod config;
pub mod context;
pub mod entities;
pub mod enums;
pub mod error;
pub mod gateway;
pub mod host;
pub mod identity;
pub mod store;
pub mod url;

pub use config::ExtensionConfiguration;
pub use context::ExtensionContext;
pub use entities::{
    Bookmark, BookmarkDraft, CachedMetadataRecord, CheckResponse, PageMetadata, Suggestion, Tag,
    UserProfile,
};
pub use enums::{BadgeState, Disposition, FetchIntent};
pub use error::{BadgeError, ConfigError, GatewayError, StorageError, TabmarkError, TabmarkResult};
pub use gateway::{BookmarkGateway, GatewayFactory, SaveOptions, SearchOptions};
pub use host::{BadgeAppearance, BadgeHost};
pub use identity::{BookmarkId, TabId, TabIdentity, Timestamp};
pub use store::{
    read_json, write_json, KeyValueStore, CONFIG_KEY, PROFILE_CACHE_KEY,
    SERVER_METADATA_CACHE_KEY,
};
pub use url::{is_bookmarkable, is_new_tab_page};
