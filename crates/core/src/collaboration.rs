//! Collaborative spreadsheet editing: cell locks and the WebSocket message
//! protocol.
//!
//! The stream spreadsheet lets several moderators edit at once. Before a
//! client edits a cell it asks for a lock; the broker grants it unless
//! another user holds an unexpired lock on the same cell. Locks expire after
//! the edit timeout (30 seconds by default) so an abandoned edit never blocks
//! a cell for long. A user edits one cell at a time: taking a new lock drops
//! the previous one held by the same connection.
//!
//! The broker is in-memory and process-local. It holds no database state;
//! committed edits go through the stream repository like any other update.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// How long a cell lock lives without being refreshed.
pub const DEFAULT_EDIT_TIMEOUT_SECS: i64 = 30;

/// How often the sweeper looks for expired locks (milliseconds).
pub const LOCK_SWEEP_INTERVAL_MS: u64 = 1000;

/// Stream columns editable from the spreadsheet.
pub const EDITABLE_COLUMNS: &[&str] = &[
    "source",
    "link",
    "title",
    "platform",
    "status",
    "orientation",
    "kind",
    "city",
    "state",
    "notes",
    "posted_by",
];

/// Cursor/lock colours handed out to collaborators.
pub const USER_COLORS: &[&str] = &[
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#469990",
    "#9a6324", "#800000",
];

/// Stable colour for a user across sessions.
pub fn color_for_user(user_id: DbId) -> &'static str {
    USER_COLORS[user_id.rem_euclid(USER_COLORS.len() as i64) as usize]
}

pub fn is_editable_column(column: &str) -> bool {
    EDITABLE_COLUMNS.contains(&column)
}

/// Validate a cell reference from a client message.
pub fn validate_cell(stream_id: DbId, column: &str) -> Result<(), String> {
    if stream_id <= 0 {
        return Err(format!("stream_id must be positive, got {stream_id}"));
    }
    if !is_editable_column(column) {
        return Err(format!(
            "Column '{column}' is not editable. Must be one of: {}",
            EDITABLE_COLUMNS.join(", ")
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Lock types
// ---------------------------------------------------------------------------

/// Identifies a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub stream_id: DbId,
    pub column: String,
}

impl CellKey {
    pub fn new(stream_id: DbId, column: impl Into<String>) -> Self {
        Self {
            stream_id,
            column: column.into(),
        }
    }
}

/// A held cell lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellLock {
    pub stream_id: DbId,
    pub column: String,
    pub user_id: DbId,
    /// WebSocket connection that took the lock.
    #[serde(skip)]
    pub conn_id: String,
    pub color: &'static str,
    pub acquired_at: Timestamp,
    pub expires_at: Timestamp,
}

impl CellLock {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.stream_id, self.column.clone())
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

/// Result of a lock request.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOutcome {
    /// The caller now holds the lock. `released` lists locks the same
    /// connection held on other cells, which were dropped.
    Granted {
        lock: CellLock,
        released: Vec<CellLock>,
    },
    /// The caller already held the lock; its expiry was pushed back.
    Refreshed(CellLock),
    /// Another user holds an unexpired lock.
    Denied(CellLock),
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

/// In-memory authority for cell locks.
pub struct CellLockBroker {
    timeout: Duration,
    locks: Mutex<HashMap<CellKey, CellLock>>,
}

impl CellLockBroker {
    pub fn new(timeout_secs: i64) -> Self {
        Self {
            timeout: Duration::seconds(timeout_secs),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout.num_seconds()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<CellKey, CellLock>> {
        // A panic while holding the guard leaves the map itself consistent.
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Request the lock on `key` for `user_id` on connection `conn_id`.
    pub fn acquire(&self, key: CellKey, user_id: DbId, conn_id: &str, now: Timestamp) -> LockOutcome {
        let mut locks = self.guard();

        if let Some(existing) = locks.get_mut(&key) {
            if !existing.is_expired(now) {
                if existing.user_id != user_id {
                    return LockOutcome::Denied(existing.clone());
                }
                existing.expires_at = now + self.timeout;
                existing.conn_id = conn_id.to_string();
                return LockOutcome::Refreshed(existing.clone());
            }
        }

        let stale: Vec<CellKey> = locks
            .iter()
            .filter(|(k, l)| **k != key && l.conn_id == conn_id)
            .map(|(k, _)| k.clone())
            .collect();
        let released = stale.iter().filter_map(|k| locks.remove(k)).collect();

        let lock = CellLock {
            stream_id: key.stream_id,
            column: key.column.clone(),
            user_id,
            conn_id: conn_id.to_string(),
            color: color_for_user(user_id),
            acquired_at: now,
            expires_at: now + self.timeout,
        };
        locks.insert(key, lock.clone());

        LockOutcome::Granted { lock, released }
    }

    /// Release `key` if `user_id` holds it. Returns the released lock.
    pub fn release(&self, key: &CellKey, user_id: DbId) -> Option<CellLock> {
        let mut locks = self.guard();
        match locks.get(key) {
            Some(lock) if lock.user_id == user_id => locks.remove(key),
            _ => None,
        }
    }

    /// Extend a lock `user_id` already holds, before committing an edit.
    ///
    /// Fails with the current holder (if any) when the caller does not hold
    /// an unexpired lock on `key`. Unlike [`acquire`](Self::acquire), this
    /// never takes a free cell.
    pub fn renew(
        &self,
        key: &CellKey,
        user_id: DbId,
        conn_id: &str,
        now: Timestamp,
    ) -> Result<CellLock, Option<CellLock>> {
        let mut locks = self.guard();
        match locks.get_mut(key) {
            Some(lock) if !lock.is_expired(now) && lock.user_id == user_id => {
                lock.expires_at = now + self.timeout;
                lock.conn_id = conn_id.to_string();
                Ok(lock.clone())
            }
            Some(lock) if !lock.is_expired(now) => Err(Some(lock.clone())),
            _ => Err(None),
        }
    }

    /// The current unexpired holder of `key`.
    pub fn holder_of(&self, key: &CellKey, now: Timestamp) -> Option<CellLock> {
        self.guard()
            .get(key)
            .filter(|lock| !lock.is_expired(now))
            .cloned()
    }

    /// Drop every lock held by a connection (on disconnect).
    pub fn release_connection(&self, conn_id: &str) -> Vec<CellLock> {
        let mut locks = self.guard();
        let keys: Vec<CellKey> = locks
            .iter()
            .filter(|(_, l)| l.conn_id == conn_id)
            .map(|(k, _)| k.clone())
            .collect();
        keys.iter().filter_map(|k| locks.remove(k)).collect()
    }

    /// Remove and return every expired lock.
    pub fn sweep_expired(&self, now: Timestamp) -> Vec<CellLock> {
        let mut locks = self.guard();
        let keys: Vec<CellKey> = locks
            .iter()
            .filter(|(_, l)| l.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.iter().filter_map(|k| locks.remove(k)).collect()
    }

    /// All unexpired locks, ordered by stream then column.
    pub fn snapshot(&self, now: Timestamp) -> Vec<CellLock> {
        let mut out: Vec<CellLock> = self
            .guard()
            .values()
            .filter(|l| !l.is_expired(now))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.stream_id, &a.column).cmp(&(b.stream_id, &b.column)));
        out
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CellLockBroker {
    fn default() -> Self {
        Self::new(DEFAULT_EDIT_TIMEOUT_SECS)
    }
}

// ---------------------------------------------------------------------------
// WebSocket message protocol
// ---------------------------------------------------------------------------

/// A collaborator in the spreadsheet session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub user_id: DbId,
    pub color: String,
}

impl Collaborator {
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            color: color_for_user(user_id).to_string(),
        }
    }
}

/// Broadcast channels a connection can subscribe to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// The spreadsheet editing session.
    #[default]
    Collaboration,
    /// Create/update/delete notifications for domain records.
    Entities,
}

/// Messages exchanged over the spreadsheet WebSocket.
///
/// Serialized as JSON with an internally-tagged `"type"` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollabMessage {
    /// Client: join a channel. Without `channel`, the spreadsheet session.
    Subscribe {
        #[serde(default)]
        channel: Channel,
    },

    /// Client: leave a channel without disconnecting.
    Unsubscribe {
        #[serde(default)]
        channel: Channel,
    },

    /// Server to requester: the entities subscription is active.
    Subscribed { channel: Channel },

    /// Client: request the lock on a cell.
    LockCell { stream_id: DbId, column: String },

    /// Client: give up the lock on a cell (blur, escape, or local timeout).
    UnlockCell { stream_id: DbId, column: String },

    /// Client: commit a new value for a locked cell.
    UpdateCell {
        stream_id: DbId,
        column: String,
        value: String,
    },

    /// Server: the current locks and collaborators, sent on subscribe.
    SessionState {
        locks: Vec<LockInfo>,
        users: Vec<Collaborator>,
        edit_timeout_secs: i64,
    },

    /// Server broadcast: a cell was locked.
    CellLocked {
        stream_id: DbId,
        column: String,
        user_id: DbId,
        color: String,
        expires_at: Timestamp,
    },

    /// Server broadcast: a cell was unlocked.
    CellUnlocked { stream_id: DbId, column: String },

    /// Server broadcast: a cell value changed.
    CellUpdated {
        stream_id: DbId,
        column: String,
        value: String,
        user_id: DbId,
    },

    /// Server to requester: another user holds the cell.
    LockDenied {
        stream_id: DbId,
        column: String,
        holder_user_id: DbId,
        expires_at: Timestamp,
    },

    /// Server broadcast: a collaborator joined.
    UserJoined { user_id: DbId, color: String },

    /// Server broadcast: a collaborator left.
    UserLeft { user_id: DbId },

    /// Server to requester: the message could not be processed.
    Error { message: String },
}

/// Lock summary embedded in [`CollabMessage::SessionState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    pub stream_id: DbId,
    pub column: String,
    pub user_id: DbId,
    pub color: String,
    pub expires_at: Timestamp,
}

impl From<&CellLock> for LockInfo {
    fn from(lock: &CellLock) -> Self {
        Self {
            stream_id: lock.stream_id,
            column: lock.column.clone(),
            user_id: lock.user_id,
            color: lock.color.to_string(),
            expires_at: lock.expires_at,
        }
    }
}

impl CollabMessage {
    pub fn locked(lock: &CellLock) -> Self {
        CollabMessage::CellLocked {
            stream_id: lock.stream_id,
            column: lock.column.clone(),
            user_id: lock.user_id,
            color: lock.color.to_string(),
            expires_at: lock.expires_at,
        }
    }

    pub fn unlocked(lock: &CellLock) -> Self {
        CollabMessage::CellUnlocked {
            stream_id: lock.stream_id,
            column: lock.column.clone(),
        }
    }

    pub fn denied(holder: &CellLock) -> Self {
        CollabMessage::LockDenied {
            stream_id: holder.stream_id,
            column: holder.column.clone(),
            holder_user_id: holder.user_id,
            expires_at: holder.expires_at,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        CollabMessage::Error {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
