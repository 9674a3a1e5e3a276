// src/session.rs
//! In-memory content sessions: the "current" text a user is working on plus a
//! bounded list of saved channel outputs (newest first).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const MAX_SAVED: usize = 50;
pub const MAX_SESSIONS: usize = 1024;
const MAX_SESSION_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedContent {
    pub id: String,
    pub channel: String,
    pub channel_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrentContent {
    pub current_content: Option<String>,
    pub current_channel: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentSession {
    #[serde(flatten)]
    pub current: CurrentContent,
    pub saved_contents: Vec<SavedContent>,
}

impl ContentSession {
    pub fn set_current(&mut self, content: String, channel: Option<String>) {
        self.current = CurrentContent {
            current_content: Some(content),
            current_channel: channel.filter(|c| !c.trim().is_empty()),
        };
    }

    pub fn clear_current(&mut self) {
        self.current = CurrentContent::default();
    }

    /// Prepend; an item with the same id is replaced. Keeps at most [`MAX_SAVED`].
    pub fn add_saved(&mut self, item: SavedContent) {
        self.saved_contents.retain(|c| c.id != item.id);
        self.saved_contents.insert(0, item);
        self.saved_contents.truncate(MAX_SAVED);
    }

    /// Returns whether something was removed.
    pub fn remove_saved(&mut self, id: &str) -> bool {
        let before = self.saved_contents.len();
        self.saved_contents.retain(|c| c.id != id);
        before != self.saved_contents.len()
    }

    pub fn clear_saved(&mut self) {
        self.saved_contents.clear();
    }
}

struct Slot {
    session: ContentSession,
    touched: u64,
}

struct Inner {
    slots: HashMap<String, Slot>,
    clock: u64,
    next_id: u64,
}

/// Session id → session, bounded; the least recently touched session is evicted.
pub struct SessionStore {
    inner: Mutex<Inner>,
    cap: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                clock: 0,
                next_id: 0,
            }),
            cap: cap.clamp(1, MAX_SESSIONS),
        }
    }

    pub fn validate_id(id: &str) -> Result<&str, ApiError> {
        let ok = !id.is_empty()
            && id.len() <= MAX_SESSION_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if ok {
            Ok(id)
        } else {
            Err(ApiError::BadRequest(format!(
                "session id must be 1-{MAX_SESSION_ID_LEN} chars of [A-Za-z0-9_-]"
            )))
        }
    }

    /// Run `f` on the session, creating it if needed.
    pub fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut ContentSession) -> R) -> R {
        let mut g = self.inner.lock();
        g.clock += 1;
        let now = g.clock;

        if !g.slots.contains_key(id) && g.slots.len() >= self.cap {
            let oldest = g
                .slots
                .iter()
                .min_by_key(|(_, s)| s.touched)
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                g.slots.remove(&k);
                tracing::debug!(target: "session", evicted = %k, "session evicted");
            }
        }

        let slot = g.slots.entry(id.to_string()).or_insert_with(|| Slot {
            session: ContentSession::default(),
            touched: now,
        });
        slot.touched = now;
        f(&mut slot.session)
    }

    /// Run `f` on an existing session only; unknown ids are left alone and
    /// nothing is evicted.
    pub fn update_existing<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut ContentSession) -> R,
    ) -> Option<R> {
        let mut g = self.inner.lock();
        g.clock += 1;
        let now = g.clock;
        let slot = g.slots.get_mut(id)?;
        slot.touched = now;
        Some(f(&mut slot.session))
    }

    /// Read-only copy; unknown ids yield an empty session.
    pub fn snapshot(&self, id: &str) -> ContentSession {
        self.inner
            .lock()
            .slots
            .get(id)
            .map(|s| s.session.clone())
            .unwrap_or_default()
    }

    /// Server-assigned id for saved items that arrive without one.
    pub fn next_item_id(&self, now: DateTime<Utc>) -> String {
        let mut g = self.inner.lock();
        g.next_id += 1;
        format!("{}-{}", now.timestamp_millis(), g.next_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
