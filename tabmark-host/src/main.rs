use std::sync::Arc;

use tabmark_background::BackgroundServices;
use tabmark_host::telemetry::init_tracing;
use tabmark_host::{
    outbound_channel, serve, ChannelBadgeHost, Dispatcher, HostConfig, HostError,
    HttpGatewayFactory,
};
use tabmark_storage::LmdbKeyValueStore;

#[tokio::main]
async fn main() -> Result<(), HostError> {
    let config = HostConfig::load()?;
    init_tracing(&config.log_filter)?;

    let store = Arc::new(LmdbKeyValueStore::open(
        &config.storage_path,
        config.storage_max_size_mb,
    )?);
    tracing::info!(
        storage_path = %config.storage_path.display(),
        "Opened extension storage"
    );

    let (outbound, inbound) = outbound_channel();
    let services = BackgroundServices::start(
        store,
        Arc::new(HttpGatewayFactory::new(config.request_timeout())),
        Arc::new(ChannelBadgeHost::new(outbound.clone())),
        config.background_options(),
    )
    .await;
    let dispatcher = Arc::new(Dispatcher::new(services, outbound));

    let result = serve(tokio::io::stdin(), tokio::io::stdout(), dispatcher, inbound).await;
    match &result {
        Ok(()) => tracing::info!("Extension closed the pipe, exiting"),
        Err(e) => tracing::error!(error = %e, "Native messaging session failed"),
    }
    result
}
