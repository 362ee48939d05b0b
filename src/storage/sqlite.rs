//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{CrawlState, PageState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const KEY_ENTRYPOINT: &str = "entrypoint";
const KEY_LAST_VISITED: &str = "last_visited";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn session_value(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn timestamps(&self, sql: &str) -> StorageResult<HashMap<String, String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<u64> {
        let n: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?)
    }

    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE id = ?2",
            params![status.to_db_string(), run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn complete_run(&mut self, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![RunStatus::Completed.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Crawl State =====

    fn save_state(&mut self, state: &CrawlState) -> StorageResult<()> {
        let visited_at = self.timestamps("SELECT url, visited_at FROM visited")?;
        let discovered_at = self.timestamps("SELECT url, discovered_at FROM images")?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![KEY_ENTRYPOINT, state.entrypoint()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO session (key, value) VALUES (?1, ?2)",
            params![KEY_LAST_VISITED, state.last_visited()],
        )?;

        tx.execute("DELETE FROM visited", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO visited (url, visited_at) VALUES (?1, ?2)")?;
            for url in state.visited() {
                let at = visited_at.get(url).unwrap_or(&now);
                stmt.execute(params![url, at])?;
            }
        }

        tx.execute("DELETE FROM frontier", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO frontier (position, url) VALUES (?1, ?2)")?;
            for (position, url) in state.frontier().iter().enumerate() {
                stmt.execute(params![position as i64, url])?;
            }
        }

        tx.execute("DELETE FROM images", [])?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO images (url, pending, discovered_at) VALUES (?1, ?2, ?3)")?;
            for url in state.discovered_images() {
                let pending = state.pending_downloads().contains(url);
                let at = discovered_at.get(url).unwrap_or(&now);
                stmt.execute(params![url, pending, at])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_state(&self) -> StorageResult<Option<CrawlState>> {
        let Some(entrypoint) = self.session_value(KEY_ENTRYPOINT)? else {
            return Ok(None);
        };
        let last_visited = self
            .session_value(KEY_LAST_VISITED)?
            .unwrap_or_else(|| entrypoint.clone());

        let visited: HashSet<String> = {
            let mut stmt = self.conn.prepare("SELECT url FROM visited")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let frontier: Vec<String> = {
            let mut stmt = self
                .conn
                .prepare("SELECT url FROM frontier ORDER BY position ASC")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut discovered = HashSet::new();
        let mut pending = HashSet::new();
        {
            let mut stmt = self.conn.prepare("SELECT url, pending FROM images")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?;
            for row in rows {
                let (url, is_pending) = row?;
                if is_pending {
                    pending.insert(url.clone());
                }
                discovered.insert(url);
            }
        }

        Ok(Some(CrawlState::restore(
            entrypoint,
            last_visited,
            visited,
            frontier,
            discovered,
            pending,
        )))
    }

    fn clear_state(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(
            "
            BEGIN;
            DELETE FROM session;
            DELETE FROM visited;
            DELETE FROM frontier;
            DELETE FROM images;
            COMMIT;
        ",
        )?;
        Ok(())
    }

    // ===== History =====

    fn record_page(
        &mut self,
        run_id: i64,
        url: &str,
        state: PageState,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO pages (run_id, url, state, error_message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(run_id, url) DO UPDATE SET
                state = excluded.state,
                error_message = excluded.error_message,
                recorded_at = excluded.recorded_at",
            params![run_id, url, state.to_db_string(), error_message, now],
        )?;
        Ok(())
    }

    fn record_download(
        &mut self,
        run_id: i64,
        image_url: &str,
        saved_path: Option<&str>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO downloads (run_id, image_url, saved_path, error_message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, image_url, saved_path, error_message, now],
        )?;
        Ok(())
    }

    // ===== Statistics =====

    fn count_visited(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM visited", [])
    }

    fn count_frontier(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM frontier", [])
    }

    fn count_images(&self, pending_only: bool) -> StorageResult<u64> {
        if pending_only {
            self.count("SELECT COUNT(*) FROM images WHERE pending = 1", [])
        } else {
            self.count("SELECT COUNT(*) FROM images", [])
        }
    }

    fn count_downloads(&self, saved: bool) -> StorageResult<u64> {
        if saved {
            self.count("SELECT COUNT(*) FROM downloads WHERE saved_path IS NOT NULL", [])
        } else {
            self.count("SELECT COUNT(*) FROM downloads WHERE saved_path IS NULL", [])
        }
    }

    fn count_pages_in_run(&self, run_id: i64, state: PageState) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM pages WHERE run_id = ?1 AND state = ?2",
            params![run_id, state.to_db_string()],
        )
    }

    fn count_runs(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM runs", [])
    }
}
