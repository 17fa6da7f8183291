#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tabmark_background::{BackgroundOptions, BackgroundServices};
use tabmark_core::{ExtensionConfiguration, TabIdentity};
use tabmark_storage::{ConfigurationStore, InMemoryKeyValueStore};
use tabmark_test_utils::fixtures::complete_configuration;
use tabmark_test_utils::{FakeGateway, FakeGatewayFactory, RecordingBadgeHost};

pub struct Harness {
    pub services: BackgroundServices,
    pub gateway: Arc<FakeGateway>,
    pub host: Arc<RecordingBadgeHost>,
    pub store: Arc<InMemoryKeyValueStore>,
}

pub async fn harness(precache_enabled: bool) -> Harness {
    harness_with(complete_configuration(precache_enabled)).await
}

pub async fn harness_with(configuration: ExtensionConfiguration) -> Harness {
    let store = Arc::new(InMemoryKeyValueStore::new());
    ConfigurationStore::new(store.clone())
        .save(&configuration)
        .await
        .unwrap();

    let gateway = Arc::new(FakeGateway::new());
    let host = Arc::new(RecordingBadgeHost::new());
    let services = BackgroundServices::start(
        store.clone(),
        Arc::new(FakeGatewayFactory::new(gateway.clone())),
        host.clone(),
        BackgroundOptions {
            omnibox_debounce: Duration::ZERO,
            ..Default::default()
        },
    )
    .await;

    Harness {
        services,
        gateway,
        host,
        store,
    }
}

pub fn tab(id: i64, url: &str) -> TabIdentity {
    TabIdentity::new(id, url, "Page title")
}
