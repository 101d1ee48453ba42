//! WebSocket infrastructure: connection management, heartbeat, the upgrade
//! handler with collaborative-editing dispatch, and entity event fan-out.

mod events;
mod handler;
mod heartbeat;
pub mod manager;

pub use events::start_event_forwarder;
pub use handler::{disconnect, dispatch, handle_text, ws_handler};
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
