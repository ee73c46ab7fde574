use std::sync::Mutex;

use anyhow::{anyhow, Result};
use uuid::Uuid;

use crate::models::{Session, SessionMode};

use super::connection::Database;
use super::repositories::sessions::{upsert_session_blocking, MAX_SESSIONS_PER_MODE};

/// Where completed sessions go. Implementations must return without
/// waiting on storage.
pub trait SessionSink: Send + Sync {
    fn persist(&self, session: &Session) -> Result<()>;
}

impl SessionSink for Database {
    fn persist(&self, session: &Session) -> Result<()> {
        let record = session.clone();
        self.submit("session upsert", move |conn| {
            upsert_session_blocking(conn, &record)
        })
    }
}

/// Volatile store with the same upsert and retention rules as the database.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first, optionally restricted to one mode.
    pub fn sessions(&self, mode: Option<SessionMode>) -> Vec<Session> {
        let guard = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .iter()
            .filter(|session| mode.map_or(true, |mode| session.mode == mode))
            .cloned()
            .collect()
    }

    pub fn delete(&self, id: Uuid) -> bool {
        let mut guard = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = guard.len();
        guard.retain(|session| session.id != id);
        guard.len() != before
    }
}

impl SessionSink for MemorySessionStore {
    fn persist(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;

        guard.retain(|existing| existing.id != session.id);
        guard.push(session.clone());
        guard.sort_by(|a, b| b.start_date.cmp(&a.start_date));

        let mode = session.mode;
        let mut seen = 0usize;
        guard.retain(|existing| {
            if existing.mode != mode {
                return true;
            }
            seen += 1;
            seen <= MAX_SESSIONS_PER_MODE
        });
        Ok(())
    }
}
