//! SQLite-backed session memory records
//!
//! One row per conversation session: rolling message window, running
//! summary, and accumulated facts. The pipeline loads the record at
//! intake and upserts it after the memory reducer runs.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from session store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Lock,
}

/// A single message in the persisted rolling window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    pub content: String,
}

/// Persisted memory for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub summary: String,
    pub facts: Vec<String>,
    pub window: Vec<StoredMessage>,
    /// Last update time (Unix ms)
    pub updated_at: i64,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }
}

/// Row returned by [`SessionStore::list`]
#[derive(Debug, Clone)]
pub struct SessionListing {
    pub session_id: String,
    pub fact_count: usize,
    pub window_len: usize,
    pub updated_at: i64,
}

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// SQLite-backed store for [`SessionRecord`]s
///
/// The connection is wrapped in a mutex; access is single-request at a
/// time, which matches how the pipeline drives it.
pub struct SessionStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SessionStore {
    /// Open (or create) a store at the given database path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "SessionStore::open: called");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                summary    TEXT NOT NULL DEFAULT '',
                facts      TEXT NOT NULL DEFAULT '[]',
                window     TEXT NOT NULL DEFAULT '[]',
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_updated_at
                ON sessions(updated_at);",
        )?;

        info!(path = %path.display(), "session store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record for a session, if one exists
    pub fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        debug!(%session_id, "SessionStore::load: called");
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        let row = conn
            .query_row(
                "SELECT summary, facts, window, updated_at FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((summary, facts_json, window_json, updated_at)) = row else {
            debug!(%session_id, "load: no record");
            return Ok(None);
        };

        Ok(Some(SessionRecord {
            session_id: session_id.to_string(),
            summary,
            facts: serde_json::from_str(&facts_json)?,
            window: serde_json::from_str(&window_json)?,
            updated_at,
        }))
    }

    /// Insert or replace the record for a session
    ///
    /// The stored `updated_at` is set to now, regardless of the value on
    /// the record.
    pub fn upsert(&self, record: &SessionRecord) -> Result<(), StoreError> {
        debug!(session_id = %record.session_id, facts = record.facts.len(), window = record.window.len(), "SessionStore::upsert: called");
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        conn.execute(
            "INSERT INTO sessions (session_id, summary, facts, window, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(session_id) DO UPDATE SET
                summary = excluded.summary,
                facts = excluded.facts,
                window = excluded.window,
                updated_at = excluded.updated_at",
            params![
                record.session_id,
                record.summary,
                serde_json::to_string(&record.facts)?,
                serde_json::to_string(&record.window)?,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    /// Delete a session record; returns true if a row was removed
    pub fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        debug!(%session_id, "SessionStore::delete: called");
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;
        let affected = conn.execute("DELETE FROM sessions WHERE session_id = ?1", params![session_id])?;
        Ok(affected > 0)
    }

    /// List all sessions, most recently updated first
    pub fn list(&self) -> Result<Vec<SessionListing>, StoreError> {
        debug!("SessionStore::list: called");
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;

        let mut stmt = conn.prepare(
            "SELECT session_id, facts, window, updated_at FROM sessions ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut listings = Vec::new();
        for row in rows {
            let (session_id, facts_json, window_json, updated_at) = row?;
            let facts: Vec<String> = serde_json::from_str(&facts_json)?;
            let window: Vec<StoredMessage> = serde_json::from_str(&window_json)?;
            listings.push(SessionListing {
                session_id,
                fact_count: facts.len(),
                window_len: window.len(),
                updated_at,
            });
        }
        Ok(listings)
    }

    /// Delete sessions not updated within the last `max_age_days`
    ///
    /// Returns the number of sessions removed.
    pub fn prune(&self, max_age_days: u32) -> Result<usize, StoreError> {
        debug!(%max_age_days, "SessionStore::prune: called");
        let cutoff = now_ms() - i64::from(max_age_days) * 24 * 60 * 60 * 1000;
        let conn = self.conn.lock().map_err(|_| StoreError::Lock)?;
        let removed = conn.execute("DELETE FROM sessions WHERE updated_at < ?1", params![cutoff])?;
        if removed > 0 {
            info!(removed, %max_age_days, "pruned stale sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SessionStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = SessionStore::open(dir.path().join("sessions.db")).expect("open store");
        (dir, store)
    }

    #[test]
    fn test_load_missing_session() {
        let (_dir, store) = open_temp();
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn test_upsert_and_load_roundtrip() {
        let (_dir, store) = open_temp();

        let mut record = SessionRecord::new("sess-1");
        record.summary = "User is setting up a laptop.".to_string();
        record.facts = vec!["os: macos".to_string(), "team: platform".to_string()];
        record.window = vec![
            StoredMessage {
                role: "user".to_string(),
                content: "How do I set up the VPN?".to_string(),
            },
            StoredMessage {
                role: "assistant".to_string(),
                content: "Install the client from the portal.".to_string(),
            },
        ];

        store.upsert(&record).unwrap();

        let loaded = store.load("sess-1").unwrap().expect("record exists");
        assert_eq!(loaded.summary, record.summary);
        assert_eq!(loaded.facts, record.facts);
        assert_eq!(loaded.window, record.window);
        assert!(loaded.updated_at > 0);
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let (_dir, store) = open_temp();

        let mut record = SessionRecord::new("sess-1");
        record.summary = "first".to_string();
        store.upsert(&record).unwrap();

        record.summary = "second".to_string();
        record.facts.push("key: value".to_string());
        store.upsert(&record).unwrap();

        let loaded = store.load("sess-1").unwrap().unwrap();
        assert_eq!(loaded.summary, "second");
        assert_eq!(loaded.facts.len(), 1);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = open_temp();
        store.upsert(&SessionRecord::new("sess-1")).unwrap();

        assert!(store.delete("sess-1").unwrap());
        assert!(!store.delete("sess-1").unwrap());
        assert!(store.load("sess-1").unwrap().is_none());
    }

    #[test]
    fn test_list_counts() {
        let (_dir, store) = open_temp();

        let mut a = SessionRecord::new("a");
        a.facts = vec!["x: 1".to_string(), "y: 2".to_string()];
        store.upsert(&a).unwrap();
        store.upsert(&SessionRecord::new("b")).unwrap();

        let listings = store.list().unwrap();
        assert_eq!(listings.len(), 2);
        let a_row = listings.iter().find(|l| l.session_id == "a").unwrap();
        assert_eq!(a_row.fact_count, 2);
        assert_eq!(a_row.window_len, 0);
    }

    #[test]
    fn test_prune_keeps_recent() {
        let (_dir, store) = open_temp();
        store.upsert(&SessionRecord::new("fresh")).unwrap();

        // Just-written rows are within any positive age window
        let removed = store.prune(30).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
