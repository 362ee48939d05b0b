//! Database schema definitions
//!
//! The crawl state tables (`session`, `visited`, `frontier`, `images`) hold
//! exactly one resumable state. The history tables (`runs`, `pages`,
//! `downloads`) accumulate across process runs.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track harvest runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Session scalars: entrypoint, last_visited
CREATE TABLE IF NOT EXISTS session (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Pages already analyzed
CREATE TABLE IF NOT EXISTS visited (
    url TEXT PRIMARY KEY,
    visited_at TEXT NOT NULL
);

-- Crawl frontier queue, dequeued in position order
CREATE TABLE IF NOT EXISTS frontier (
    position INTEGER PRIMARY KEY,
    url TEXT NOT NULL UNIQUE
);

-- Every image page ever discovered; pending = awaiting the next download batch
CREATE TABLE IF NOT EXISTS images (
    url TEXT PRIMARY KEY,
    pending INTEGER NOT NULL DEFAULT 1,
    discovered_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_images_pending ON images(pending);

-- Page lifecycle per run
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    state TEXT NOT NULL,
    error_message TEXT,
    recorded_at TEXT NOT NULL,
    UNIQUE(run_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_state ON pages(state);

-- Per-image download outcomes
CREATE TABLE IF NOT EXISTS downloads (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    image_url TEXT NOT NULL,
    saved_path TEXT,
    error_message TEXT,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_downloads_image ON downloads(image_url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
