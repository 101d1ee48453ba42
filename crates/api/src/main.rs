use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use streamsource_core::collaboration::CellLockBroker;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamsource_api::background::{lock_sweeper, session_cleanup, stream_archiver};
use streamsource_api::config::ServerConfig;
use streamsource_api::router::build_app_router;
use streamsource_api::state::AppState;
use streamsource_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "streamsource_api=debug,tower_http=debug".into());
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

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = streamsource_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    streamsource_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    streamsource_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Realtime ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let lock_broker = Arc::new(CellLockBroker::new(config.cell_edit_timeout_secs));
    let event_bus = Arc::new(streamsource_events::EventBus::default());

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let background = vec![
        ws::start_event_forwarder(Arc::clone(&event_bus), Arc::clone(&ws_manager), cancel.clone()),
        tokio::spawn(lock_sweeper::run(
            Arc::clone(&lock_broker),
            Arc::clone(&ws_manager),
            cancel.clone(),
        )),
        tokio::spawn(stream_archiver::run(
            pool.clone(),
            Arc::clone(&event_bus),
            config.stream_archive_after_hours,
            cancel.clone(),
        )),
        tokio::spawn(session_cleanup::run(pool.clone(), cancel.clone())),
    ];
    tracing::info!(tasks = background.len(), "Background tasks started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        lock_broker,
        event_bus,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let wait = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(wait, futures::future::join_all(background))
        .await
        .is_err()
    {
        tracing::warn!(timeout_secs = config.shutdown_timeout_secs, "Background tasks did not stop in time");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
