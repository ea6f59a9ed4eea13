//! SQLite database backing the persisted store directory.
//!
//! The store directory holds a single `memories.db` file (plus WAL side files).
//! Backups archive the whole directory, so nothing else should live there.

pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::{Path, PathBuf};
use std::sync::Once;

/// Database file name inside the store directory.
pub const DB_FILE_NAME: &str = "memories.db";

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Path of the database file for a given store directory.
pub fn database_path(store_dir: &Path) -> PathBuf {
    store_dir.join(DB_FILE_NAME)
}

/// Open (or create) the store database inside `store_dir`, with sqlite-vec
/// loaded and schema initialized.
pub fn open_database(store_dir: impl AsRef<Path>) -> Result<Connection> {
    let store_dir = store_dir.as_ref();
    std::fs::create_dir_all(store_dir)
        .with_context(|| format!("failed to create store directory {}", store_dir.display()))?;

    load_sqlite_vec();

    let path = database_path(store_dir);
    let conn = Connection::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    schema::init_schema(&conn).context("failed to initialize schema")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the full schema. Used by tests and dry runs.
pub fn open_memory_database() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    Ok(conn)
}
