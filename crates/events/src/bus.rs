//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`EntityEvent`]s.
//! It is shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streamsource_core::types::DbId;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EntityEvent
// ---------------------------------------------------------------------------

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityAction {
    Created,
    Updated,
    Deleted,
}

impl EntityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityAction::Created => "created",
            EntityAction::Updated => "updated",
            EntityAction::Deleted => "deleted",
        }
    }
}

/// A change to a domain record.
///
/// `payload` carries the serialized record after the change (or
/// `{"id": ..}` for deletions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEvent {
    pub action: EntityAction,

    /// Table-style entity name, e.g. `"stream"`, `"annotation"`.
    pub entity_type: String,

    pub entity_id: DbId,

    /// The user that made the change. `None` for background jobs.
    pub actor_user_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl EntityEvent {
    pub fn new(action: EntityAction, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        Self {
            action,
            entity_type: entity_type.into(),
            entity_id,
            actor_user_id: None,
            payload: serde_json::json!({ "id": entity_id }),
            timestamp: Utc::now(),
        }
    }

    pub fn created(entity_type: impl Into<String>, entity_id: DbId) -> Self {
        Self::new(EntityAction::Created, entity_type, entity_id)
    }

    pub fn updated(entity_type: impl Into<String>, entity_id: DbId) -> Self {
        Self::new(EntityAction::Updated, entity_type, entity_id)
    }

    pub fn deleted(entity_type: impl Into<String>, entity_id: DbId) -> Self {
        Self::new(EntityAction::Deleted, entity_type, entity_id)
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Serialize `record` as the payload. Serialization failures keep the
    /// default `{"id": ..}` payload.
    pub fn with_record<T: Serialize>(mut self, record: &T) -> Self {
        match serde_json::to_value(record) {
            Ok(value) => self.payload = value,
            Err(e) => {
                tracing::warn!(error = %e, entity_type = %self.entity_type, "Failed to serialize event payload");
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`EntityEvent`].
pub struct EventBus {
    sender: broadcast::Sender<EntityEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: EntityEvent) {
        tracing::debug!(
            action = event.action.as_str(),
            entity_type = %event.entity_type,
            entity_id = event.entity_id,
            "Publishing entity event",
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
