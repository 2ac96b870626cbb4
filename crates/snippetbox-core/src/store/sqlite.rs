//! SQLite implementation of [`SnippetStore`].

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::schema;
use super::{DEFAULT_LATEST_LIMIT, Snippet, SnippetStore, StoreError};
use crate::clock::{Clock, SystemClock};
use crate::Error;

/// Snippet store backed by a single SQLite connection.
pub struct SqliteSnippetStore {
    /// SQLite connection (protected by mutex for thread safety).
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    latest_limit: usize,
}

impl SqliteSnippetStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Database(format!("Failed to open SQLite: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| Error::Database(format!("Failed to set PRAGMA: {}", e)))?;

        tracing::info!(path = %path.display(), "snippet database opened");

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("Failed to open in-memory SQLite: {}", e)))?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> crate::Result<Self> {
        schema::init_schema(&conn)
            .map_err(|e| Error::Database(format!("Failed to init schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
            latest_limit: DEFAULT_LATEST_LIMIT,
        })
    }

    /// Use `clock` as the source of "now" for expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Bound [`SnippetStore::latest`] to `limit` rows.
    pub fn with_latest_limit(mut self, limit: usize) -> crate::Result<Self> {
        if limit == 0 {
            return Err(Error::Config("latest limit must be at least 1".to_string()));
        }
        self.latest_limit = limit;
        Ok(self)
    }

    /// The configured bound for [`SnippetStore::latest`].
    pub fn latest_limit(&self) -> usize {
        self.latest_limit
    }
}

impl SnippetStore for SqliteSnippetStore {
    fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, StoreError> {
        let created = self.clock.now();
        let expires = created + Duration::days(expires_days);

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO snippets (title, content, created, expires) VALUES (?1, ?2, ?3, ?4)",
            params![title, content, created.timestamp(), expires.timestamp()],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!(id, expires_days, "snippet inserted");
        Ok(id)
    }

    fn get(&self, id: i64) -> Result<Snippet, StoreError> {
        let now = self.clock.now().timestamp();

        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, title, content, created, expires FROM snippets \
                 WHERE id = ?1 AND expires > ?2",
                params![id, now],
                RawSnippet::from_row,
            )
            .optional()?;

        row.ok_or(StoreError::NoRecord)?.into_snippet()
    }

    fn latest(&self) -> Result<Vec<Snippet>, StoreError> {
        let now = self.clock.now().timestamp();

        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, title, content, created, expires FROM snippets \
             WHERE expires > ?1 \
             ORDER BY created DESC, id DESC \
             LIMIT ?2",
        )?;

        let rows = stmt
            .query_map(params![now, self.latest_limit as i64], RawSnippet::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(RawSnippet::into_snippet).collect()
    }
}

/// A snippet row with timestamps still in stored form.
struct RawSnippet {
    id: i64,
    title: String,
    content: String,
    created: i64,
    expires: i64,
}

impl RawSnippet {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            created: row.get(3)?,
            expires: row.get(4)?,
        })
    }

    fn into_snippet(self) -> Result<Snippet, StoreError> {
        Ok(Snippet {
            id: self.id,
            title: self.title,
            content: self.content,
            created: timestamp("created", self.created)?,
            expires: timestamp("expires", self.expires)?,
        })
    }
}

fn timestamp(column: &'static str, value: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(value, 0).ok_or(StoreError::InvalidTimestamp { column, value })
}
