//! Snippet model and the storage contract handlers depend on.
//!
//! The contract is expiry-aware: rows whose `expires` has passed are never
//! returned by [`SnippetStore::get`] or [`SnippetStore::latest`], but they are
//! not deleted either.

mod schema;
mod sqlite;

use chrono::{DateTime, Utc};

pub use self::sqlite::SqliteSnippetStore;

/// Default number of snippets returned by [`SnippetStore::latest`].
pub const DEFAULT_LATEST_LIMIT: usize = 10;

/// A stored snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Store-assigned identifier, always positive.
    pub id: i64,
    /// Short title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Time after which the snippet is no longer visible.
    pub expires: DateTime<Utc>,
}

/// Snippet store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No visible row matched. Covers both absent and expired snippets.
    #[error("no matching record found")]
    NoRecord,

    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored timestamp could not be converted back to a date.
    #[error("invalid timestamp {value} in column {column}")]
    InvalidTimestamp {
        /// Column holding the bad value.
        column: &'static str,
        /// The raw stored value.
        value: i64,
    },
}

/// Expiry-aware snippet persistence.
///
/// Implementations must assign ids atomically and give `get`/`latest` a
/// consistent view at call time.
pub trait SnippetStore: Send + Sync {
    /// Persist a new snippet expiring `expires_days` days from now and return
    /// its id.
    ///
    /// Callers validate `expires_days` beforehand.
    fn insert(&self, title: &str, content: &str, expires_days: i64) -> Result<i64, StoreError>;

    /// Fetch a snippet by id, provided it exists and has not expired.
    fn get(&self, id: i64) -> Result<Snippet, StoreError>;

    /// The most recently created unexpired snippets, newest first.
    fn latest(&self) -> Result<Vec<Snippet>, StoreError>;
}
