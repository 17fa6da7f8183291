//! Host (browser action) badge contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::enums::BadgeState;
use crate::error::BadgeError;
use crate::identity::TabId;

pub const BOOKMARKED_BADGE_TEXT: &str = "★";
pub const SAVED_BADGE_TEXT: &str = "✓";

/// Everything the host needs to draw a badge for one tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAppearance {
    pub text: String,
    pub text_color: String,
    pub background_color: String,
    pub title: String,
}

impl BadgeAppearance {
    pub fn for_state(state: BadgeState) -> Self {
        match state {
            BadgeState::Empty => Self {
                text: String::new(),
                text_color: "#ffffff".to_string(),
                background_color: "#5856e0".to_string(),
                title: String::new(),
            },
            BadgeState::Bookmarked => Self {
                text: BOOKMARKED_BADGE_TEXT.to_string(),
                text_color: "#ffffff".to_string(),
                background_color: "#5856e0".to_string(),
                title: "Bookmarked".to_string(),
            },
            BadgeState::SavedPulse => Self {
                text: SAVED_BADGE_TEXT.to_string(),
                text_color: "#ffffff".to_string(),
                background_color: "#32b643".to_string(),
                title: "Bookmark saved".to_string(),
            },
        }
    }

    /// Recover the state a badge text stands for.
    pub fn state_of_text(text: &str) -> BadgeState {
        match text {
            BOOKMARKED_BADGE_TEXT => BadgeState::Bookmarked,
            SAVED_BADGE_TEXT => BadgeState::SavedPulse,
            _ => BadgeState::Empty,
        }
    }
}

/// The browser action badge, scoped per tab.
#[async_trait]
pub trait BadgeHost: Send + Sync {
    async fn set_badge(&self, tab_id: TabId, appearance: &BadgeAppearance)
        -> Result<(), BadgeError>;

    /// Current badge text of a tab, empty when none is set.
    async fn badge_text(&self, tab_id: TabId) -> Result<String, BadgeError>;
}
