//! Enum types

use serde::{Deserialize, Serialize};

/// Visible badge state of a single tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeState {
    /// No badge; the URL is not known to be bookmarked.
    #[default]
    Empty,
    /// The URL is bookmarked.
    Bookmarked,
    /// A bookmark was just saved; replaced after the settle delay.
    SavedPulse,
}

/// Why metadata is being fetched.
///
/// Precache fetches happen before the user has shown any intent to bookmark
/// the page and are gated by the user's precache opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchIntent {
    /// Anticipatory load triggered by navigation.
    Precache,
    /// The user opened the add/edit UI.
    Explicit,
}

impl FetchIntent {
    pub fn is_precache(&self) -> bool {
        matches!(self, Self::Precache)
    }
}

/// Where the browser should open an omnibox selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Disposition {
    CurrentTab,
    NewForegroundTab,
    NewBackgroundTab,
}
