use std::sync::Arc;

use streamsource_core::collaboration::CellLockBroker;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is a pool handle or an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: streamsource_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Cell locks for collaborative editing.
    pub lock_broker: Arc<CellLockBroker>,
    /// Entity change fan-out.
    pub event_bus: Arc<streamsource_events::EventBus>,
}
