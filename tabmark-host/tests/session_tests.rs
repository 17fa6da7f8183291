//! End-to-end native messaging sessions over an in-process pipe.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use bytes::Bytes;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use tabmark_background::{BackgroundOptions, BackgroundServices};
use tabmark_host::{
    native_codec, outbound_channel, serve, ChannelBadgeHost, Dispatcher, HostError,
};
use tabmark_storage::{ConfigurationStore, InMemoryKeyValueStore};
use tabmark_test_utils::fixtures::{bookmark, complete_configuration, BASE_URL};
use tabmark_test_utils::{FakeGateway, FakeGatewayFactory};

struct Session {
    frames_in: FramedRead<ReadHalf<DuplexStream>, LengthDelimitedCodec>,
    frames_out: FramedWrite<WriteHalf<DuplexStream>, LengthDelimitedCodec>,
    gateway: Arc<FakeGateway>,
    server: JoinHandle<Result<(), HostError>>,
}

impl Session {
    async fn start() -> Self {
        let store = Arc::new(InMemoryKeyValueStore::new());
        ConfigurationStore::new(store.clone())
            .save(&complete_configuration(true))
            .await
            .unwrap();

        let gateway = Arc::new(FakeGateway::new());
        let (outbound, inbound) = outbound_channel();
        let services = BackgroundServices::start(
            store,
            Arc::new(FakeGatewayFactory::new(gateway.clone())),
            Arc::new(ChannelBadgeHost::new(outbound.clone())),
            BackgroundOptions {
                omnibox_debounce: Duration::ZERO,
                ..Default::default()
            },
        )
        .await;
        let dispatcher = Arc::new(Dispatcher::new(services, outbound));

        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let server = tokio::spawn(serve(server_read, server_write, dispatcher, inbound));

        let (client_read, client_write) = tokio::io::split(client);
        Self {
            frames_in: FramedRead::new(client_read, native_codec()),
            frames_out: FramedWrite::new(client_write, native_codec()),
            gateway,
            server,
        }
    }

    async fn send(&mut self, message: Value) {
        self.frames_out
            .send(Bytes::from(serde_json::to_vec(&message).unwrap()))
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, body: &'static [u8]) {
        self.frames_out.send(Bytes::from_static(body)).await.unwrap();
    }

    async fn next(&mut self) -> Value {
        let frame = tokio::time::timeout(Duration::from_secs(5), self.frames_in.next())
            .await
            .expect("no frame within timeout")
            .expect("pipe closed")
            .unwrap();
        serde_json::from_slice(&frame).unwrap()
    }

    /// Read frames until the reply for `id` arrives, returning everything seen.
    async fn until_reply(&mut self, id: u64) -> Vec<Value> {
        let mut seen = Vec::new();
        loop {
            let frame = self.next().await;
            let done = frame["id"] == id;
            seen.push(frame);
            if done {
                return seen;
            }
        }
    }
}

#[tokio::test]
async fn test_activation_sets_badge_before_reply() {
    let mut session = Session::start().await;
    session
        .gateway
        .add_bookmark(bookmark(3, "https://example.com/saved"));

    session
        .send(json!({
            "id": 1,
            "type": "navigation",
            "event": "activated",
            "tab": { "id": 7, "url": "https://example.com/saved", "title": "Saved" },
        }))
        .await;

    let frames = session.until_reply(1).await;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["type"], "set_badge");
    assert_eq!(frames[0]["tab_id"], 7);
    assert_eq!(frames[0]["badge"]["text"], "★");
    assert_eq!(frames[1]["type"], "response");
    assert_eq!(frames[1]["result"]["outcome"], "refreshed");
    assert_eq!(frames[1]["result"]["bookmarked"], true);
}

#[tokio::test]
async fn test_quick_save_notifies_then_replies() {
    let mut session = Session::start().await;
    let link = "https://example.com/article";

    session
        .send(json!({ "id": 2, "type": "quick_save", "link_url": link }))
        .await;

    let frames = session.until_reply(2).await;
    assert_eq!(frames[0]["type"], "notification");
    assert_eq!(
        frames[0]["message"],
        format!("Saved bookmark \"Title of {link}\"")
    );
    assert_eq!(frames[1]["result"]["result"], "saved");
    assert_eq!(session.gateway.saved().len(), 1);

    session
        .send(json!({ "id": 3, "type": "quick_save", "link_url": link }))
        .await;
    let frames = session.until_reply(3).await;
    assert_eq!(frames[0]["message"], "Bookmark already saved");
    assert_eq!(frames[1]["result"]["result"], "already_saved");
    assert_eq!(session.gateway.saved().len(), 1);
}

#[tokio::test]
async fn test_omnibox_enter_pushes_navigation() {
    let mut session = Session::start().await;

    session
        .send(json!({
            "id": 4,
            "type": "omnibox_entered",
            "content": "rust async",
            "disposition": "newForegroundTab",
        }))
        .await;

    let frames = session.until_reply(4).await;
    let expected = format!("{BASE_URL}/bookmarks?q=rust%20async");
    assert_eq!(frames[0]["type"], "navigate");
    assert_eq!(frames[0]["url"], expected);
    assert_eq!(frames[0]["disposition"], "newForegroundTab");
    assert_eq!(frames[1]["result"]["url"], expected);
}

#[tokio::test]
async fn test_malformed_request_gets_error_reply() {
    let mut session = Session::start().await;

    session.send(json!({ "id": 9, "type": "reboot" })).await;
    let reply = session.next().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["id"], 9);

    session.send_raw(b"{not json").await;
    let reply = session.next().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["id"], Value::Null);

    // The session keeps serving after bad input.
    session.send(json!({ "id": 10, "type": "omnibox_started" })).await;
    let reply = session.next().await;
    assert_eq!(reply["result"], "Search bookmarks in linkding");
}

#[tokio::test]
async fn test_requests_without_id_get_no_reply() {
    let mut session = Session::start().await;

    session
        .send(json!({
            "type": "navigation",
            "event": "removed",
            "tab_id": 4,
        }))
        .await;
    session.send(json!({ "id": 11, "type": "cache_stats" })).await;

    let reply = session.next().await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["id"], 11);
}

#[tokio::test]
async fn test_end_of_input_flushes_pending_replies() {
    let mut session = Session::start().await;
    session
        .gateway
        .set_search_delay("example", Duration::from_millis(50));
    session
        .gateway
        .set_search_results("example", vec![bookmark(1, "https://example.com/a")]);

    session
        .send(json!({ "id": 12, "type": "search_page", "query": "example" }))
        .await;
    SinkExt::<Bytes>::close(&mut session.frames_out).await.unwrap();

    let reply = session.next().await;
    assert_eq!(reply["id"], 12);
    assert_eq!(reply["result"].as_array().map(Vec::len), Some(1));

    session.server.await.unwrap().unwrap();
    assert!(session.frames_in.next().await.is_none());
}
