//! Session storage backends.

use std::collections::HashMap;
use std::time::Duration;

use moka::sync::Cache;

/// Values held by one session.
pub type SessionValues = HashMap<String, String>;

/// Session backend failure.
#[derive(Debug, thiserror::Error)]
#[error("session backend error: {0}")]
pub struct SessionError(pub String);

/// Persistence for session values keyed by an opaque token.
pub trait SessionStore: Send + Sync {
    /// Load the values stored under `token`, if the session exists and is live.
    fn find(&self, token: &str) -> Result<Option<SessionValues>, SessionError>;

    /// Store `values` under `token`, replacing anything already there.
    fn commit(&self, token: &str, values: SessionValues) -> Result<(), SessionError>;
}

/// Default maximum number of live sessions kept in memory.
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100_000;

/// In-process session store. Sessions expire `lifetime` after their last commit.
#[derive(Clone)]
pub struct MemoryStore {
    sessions: Cache<String, SessionValues>,
}

impl MemoryStore {
    /// Create a store whose entries live for `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(DEFAULT_MEMORY_CAPACITY)
            .time_to_live(lifetime)
            .build();

        Self { sessions }
    }
}

impl SessionStore for MemoryStore {
    fn find(&self, token: &str) -> Result<Option<SessionValues>, SessionError> {
        Ok(self.sessions.get(token))
    }

    fn commit(&self, token: &str, values: SessionValues) -> Result<(), SessionError> {
        self.sessions.insert(token.to_string(), values);
        Ok(())
    }
}
