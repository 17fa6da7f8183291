//! Routes requests from the extension to the background services.

use tokio::sync::mpsc;

use tabmark_background::{BackgroundServices, PopupView, QuickSaveOutcome};
use tabmark_core::Disposition;

use crate::protocol::{Envelope, HostMessage, HostRequest};

pub struct Dispatcher {
    services: BackgroundServices,
    outbound: mpsc::Sender<HostMessage>,
}

impl Dispatcher {
    pub fn new(services: BackgroundServices, outbound: mpsc::Sender<HostMessage>) -> Self {
        Self { services, outbound }
    }

    pub fn services(&self) -> &BackgroundServices {
        &self.services
    }

    /// Handle one request and build its reply.
    ///
    /// Side effects the browser must carry out (navigations, notifications)
    /// are pushed as separate frames before the reply.
    pub async fn dispatch(&self, envelope: Envelope) -> HostMessage {
        let id = envelope.id;
        tracing::debug!(request_id = ?id, kind = envelope.request.kind(), "Dispatching request");

        match envelope.request {
            HostRequest::Navigation(event) => {
                let outcome = self.services.coordinator.handle(event).await;
                HostMessage::response(id, &outcome)
            }
            HostRequest::PopupOpened { tab } => {
                let view = self.services.actions.prepare_popup(&tab).await;
                if let PopupView::Redirect { url } = &view {
                    self.push(HostMessage::Navigate {
                        url: url.clone(),
                        disposition: Disposition::CurrentTab,
                    })
                    .await;
                }
                HostMessage::response(id, &view)
            }
            HostRequest::SaveBookmark { tab, bookmark } => {
                match self.services.actions.save(&tab, bookmark).await {
                    Ok(outcome) => HostMessage::response(id, &outcome),
                    Err(e) => HostMessage::error(id, e.to_string()),
                }
            }
            HostRequest::DeleteBookmark { tab, bookmark_id } => {
                match self.services.actions.delete(&tab, bookmark_id).await {
                    Ok(()) => HostMessage::response(id, &serde_json::Value::Null),
                    Err(e) => HostMessage::error(id, e.to_string()),
                }
            }
            HostRequest::QuickSave { link_url } => {
                let outcome = self.services.actions.quick_save_link(&link_url).await;
                match &outcome {
                    QuickSaveOutcome::AlreadySaved => {
                        self.push(HostMessage::notification("Bookmark already saved"))
                            .await;
                    }
                    QuickSaveOutcome::Saved { bookmark } => {
                        self.push(HostMessage::notification(format!(
                            "Saved bookmark \"{}\"",
                            bookmark.title
                        )))
                        .await;
                    }
                    _ => {}
                }
                HostMessage::response(id, &outcome)
            }
            HostRequest::OmniboxStarted => {
                let ctx = self.services.contexts.current().await;
                HostMessage::response(id, &self.services.omnibox.on_input_started(&ctx))
            }
            HostRequest::OmniboxChanged { text } => {
                let ctx = self.services.contexts.current().await;
                let result = self.services.omnibox.on_input_changed(&ctx, &text).await;
                HostMessage::response(id, &result)
            }
            HostRequest::OmniboxEntered {
                content,
                disposition,
            } => {
                let ctx = self.services.contexts.current().await;
                let navigation = self
                    .services
                    .omnibox
                    .on_input_entered(&ctx, &content, disposition);
                if let Some(navigation) = &navigation {
                    self.push(HostMessage::Navigate {
                        url: navigation.url.clone(),
                        disposition: navigation.disposition,
                    })
                    .await;
                }
                HostMessage::response(id, &navigation)
            }
            HostRequest::SearchPage { query } => {
                let ctx = self.services.contexts.current().await;
                let results = self.services.omnibox.search_page_results(&ctx, &query).await;
                HostMessage::response(id, &results)
            }
            HostRequest::GetConfiguration => {
                let ctx = self.services.contexts.current().await;
                HostMessage::response(id, &ctx.configuration)
            }
            HostRequest::SaveConfiguration { configuration } => {
                match self.services.contexts.save_configuration(configuration).await {
                    Ok(()) => HostMessage::response(id, &true),
                    Err(e) => HostMessage::error(id, e.to_string()),
                }
            }
            HostRequest::CacheStats => HostMessage::response(id, &self.services.cache.stats()),
        }
    }

    /// Send an unsolicited frame to the extension.
    pub async fn push(&self, message: HostMessage) {
        if self.outbound.send(message).await.is_err() {
            tracing::debug!("Extension disconnected, dropping outbound message");
        }
    }
}
