//! StreamSource event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EntityEvent`]: a record was created, updated, or deleted. The
//!   WebSocket layer forwards these to connected clients so lists refresh
//!   without polling.

pub mod bus;

pub use bus::{EntityAction, EntityEvent, EventBus};
