//! Single-slot time-to-live cache for the stream list.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// Holds one value until it is older than `ttl` or explicitly invalidated.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// The cached value, if present and still fresh.
    pub async fn get(&self) -> Option<T> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn put(&self, value: T) {
        *self.slot.write().await = Some(Entry {
            value,
            stored_at: Instant::now(),
        });
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
