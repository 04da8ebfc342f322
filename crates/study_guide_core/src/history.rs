//! crates/study_guide_core/src/history.rs
//!
//! The ordered collection of completed study sessions.
//!
//! Every mutation writes the whole serialized sequence back to the key-value
//! store. A failed write is logged and the in-memory sequence is kept, so
//! memory and storage can diverge until the next successful write.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{HistorySession, SessionId};
use crate::ports::KeyValueStore;

/// Storage key holding the JSON array of sessions.
pub const HISTORY_KEY: &str = "studyHistory";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("A session with id {0} already exists")]
    DuplicateId(SessionId),
}

pub struct HistoryStore {
    storage: Arc<dyn KeyValueStore>,
    sessions: Vec<HistorySession>,
}

impl HistoryStore {
    /// Reads the persisted history. Never fails: unreadable or unparsable
    /// history is logged and treated as empty.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let sessions = match storage.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistorySession>>(&raw) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!("Failed to parse stored history, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load history, starting empty: {}", e);
                Vec::new()
            }
        };
        info!("Loaded {} history session(s)", sessions.len());
        Self { storage, sessions }
    }

    /// Adds `session` at the end of the history and persists the result.
    pub fn append(&mut self, session: HistorySession) -> Result<(), HistoryError> {
        if self.find_by_id(&session.id).is_some() {
            return Err(HistoryError::DuplicateId(session.id));
        }
        self.sessions.push(session);
        self.persist();
        Ok(())
    }

    pub fn all(&self) -> &[HistorySession] {
        &self.sessions
    }

    pub fn find_by_id(&self, id: &SessionId) -> Option<&HistorySession> {
        self.sessions.iter().find(|session| &session.id == id)
    }

    /// The most recently created session.
    pub fn latest(&self) -> Option<&HistorySession> {
        self.sessions.last()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Produces an id for a session created at `now`, with the timestamp it
    /// encodes.
    ///
    /// The timestamp is moved forward a millisecond at a time until it is
    /// after the latest session and its id is unused, so ids stay unique and
    /// ordered even when two sessions complete within the same millisecond.
    pub fn next_id(&self, now: DateTime<Utc>) -> (SessionId, DateTime<Utc>) {
        let step = Duration::milliseconds(1);
        let mut timestamp = match self.latest() {
            Some(latest) if latest.created_at >= now => latest.created_at + step,
            _ => now,
        };
        loop {
            let id = SessionId::from_timestamp(timestamp);
            if self.find_by_id(&id).is_none() {
                return (id, timestamp);
            }
            timestamp += step;
        }
    }

    /// Removes every session and persists the empty history.
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.persist();
    }

    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.sessions) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Failed to serialize history: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(HISTORY_KEY, &serialized) {
            warn!("Failed to save history, keeping it in memory only: {}", e);
        }
    }
}
