//! Badge host that forwards writes to the extension as `set_badge` frames.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use tabmark_core::{BadgeAppearance, BadgeError, BadgeHost, TabId};

use crate::protocol::HostMessage;

/// The host process is the only writer of badges, so the text it last sent
/// for a tab is what the browser shows.
pub struct ChannelBadgeHost {
    outbound: mpsc::Sender<HostMessage>,
    texts: Mutex<HashMap<TabId, String>>,
}

impl ChannelBadgeHost {
    pub fn new(outbound: mpsc::Sender<HostMessage>) -> Self {
        Self {
            outbound,
            texts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BadgeHost for ChannelBadgeHost {
    async fn set_badge(
        &self,
        tab_id: TabId,
        appearance: &BadgeAppearance,
    ) -> Result<(), BadgeError> {
        self.outbound
            .send(HostMessage::SetBadge {
                tab_id,
                badge: appearance.clone(),
            })
            .await
            .map_err(|_| BadgeError::Unavailable {
                reason: "extension disconnected".to_string(),
            })?;
        if let Ok(mut texts) = self.texts.lock() {
            texts.insert(tab_id, appearance.text.clone());
        }
        Ok(())
    }

    async fn badge_text(&self, tab_id: TabId) -> Result<String, BadgeError> {
        let texts = self.texts.lock().map_err(|_| BadgeError::Unavailable {
            reason: "badge state lock poisoned".to_string(),
        })?;
        Ok(texts.get(&tab_id).cloned().unwrap_or_default())
    }
}
