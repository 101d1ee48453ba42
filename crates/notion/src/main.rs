use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamsource_notion::cache::TtlCache;
use streamsource_notion::client::NotionClient;
use streamsource_notion::config::NotionConfig;
use streamsource_notion::routes::build_router;
use streamsource_notion::state::ProxyState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "streamsource_notion=debug,tower_http=info".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = NotionConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        cache_ttl_secs = config.cache_ttl.as_secs(),
        max_retries = config.max_retries,
        "Loaded Notion proxy configuration"
    );

    let client = NotionClient::new(&config).context("Failed to build Notion client")?;
    let state = ProxyState {
        client: Arc::new(client),
        streams: Arc::new(TtlCache::new(config.cache_ttl)),
    };
    let app = build_router(state);

    let addr = SocketAddr::new(
        config.host.parse().context("Invalid NOTION_HOST address")?,
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "Starting Notion proxy");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received SIGINT, shutting down");
        })
        .await
        .context("Server error")?;

    tracing::info!("Notion proxy stopped");
    Ok(())
}
