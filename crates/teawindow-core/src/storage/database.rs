//! SQLite-backed progress store.
//!
//! Two tables: `progress` keyed by local day for the done/streak
//! counters, and a generic `kv` store for small host state. Writes are
//! idempotent upserts; replaying the same day's snapshot is harmless.

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::StoreError;
use crate::traits::{DayProgress, ProgressStore};

/// SQLite database holding per-day progress and host key-value state.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the database at `~/.config/teawindow/teawindow.db`.
    ///
    /// Creates the file and schema if they do not exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir()?;
        let path = dir.join("teawindow.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS progress (
                    day    TEXT PRIMARY KEY,
                    done   INTEGER NOT NULL DEFAULT 0,
                    streak INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );",
            )
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }

    /// Progress for `day`, zeros when the day has no row.
    pub fn load_progress(&self, day: &str) -> Result<DayProgress, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT done, streak FROM progress WHERE day = ?1")?;
        let result = stmt.query_row(params![day], |row| {
            Ok(DayProgress {
                done: row.get(0)?,
                streak: row.get(1)?,
            })
        });
        match result {
            Ok(progress) => Ok(progress),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(DayProgress::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Upsert the progress snapshot for `day`.
    pub fn save_progress(&self, day: &str, progress: &DayProgress) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO progress (day, done, streak) VALUES (?1, ?2, ?3)",
            params![day, progress.done, progress.streak],
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ProgressStore for Store {
    fn load(&self, day: &str) -> DayProgress {
        self.load_progress(day).unwrap_or_default()
    }

    fn save(&self, day: &str, progress: &DayProgress) -> Result<(), StoreError> {
        self.save_progress(day, progress)
    }
}
