//! The store collaborator: primitives over an embedding-indexed record store.
//!
//! [`VectorStore`] is the seam the rest of the crate talks to. [`SqliteVecStore`]
//! implements it with SQLite for records and sqlite-vec for the similarity index.
//! Distances reported by `similarity_query` are cosine distances, computed from
//! sqlite-vec's L2 distance on unit vectors as `d² / 2`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection};

use crate::db;
use crate::embedding::EmbeddingProvider;
use crate::memory::types::{timestamp_seconds, Metadata, MemoryRecord};

/// Largest `k` sqlite-vec accepts in a KNN query.
pub const KNN_MAX: usize = 4096;

/// Predicate for [`VectorStore::filtered_get`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreFilter {
    All,
    /// Records whose `tags` contain any of these values (exact match).
    AnyTag(Vec<String>),
    /// Records whose timestamp (Unix seconds) is at or after the cutoff.
    TimestampAtLeast(f64),
}

/// Store primitives. Every method may fail; callers decide how failures surface.
pub trait VectorStore: Send + Sync {
    fn add(&self, id: &str, content: &str, metadata: &Metadata) -> Result<()>;

    /// Up to `k` records ranked by ascending distance. A `None` distance means
    /// the store could not report one.
    fn similarity_query(&self, text: &str, k: usize) -> Result<Vec<(MemoryRecord, Option<f64>)>>;

    fn filtered_get(&self, filter: &StoreFilter, limit: Option<usize>) -> Result<Vec<MemoryRecord>>;

    /// Delete by id, returning how many records were removed.
    fn delete(&self, ids: &[String]) -> Result<usize>;

    /// Liveness check. A positive value means the store answered.
    fn heartbeat(&self) -> Result<i64>;

    fn count(&self) -> Result<u64>;
}

pub struct SqliteVecStore {
    conn: Mutex<Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteVecStore {
    /// Open the persisted store in `store_dir`, creating it if needed.
    pub fn open(store_dir: impl AsRef<Path>, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let store_dir = store_dir.as_ref();
        let conn = db::open_database(store_dir)?;
        Self::check_provider(&conn, embedder.name())?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    /// A throwaway store with no directory behind it.
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let conn = db::open_memory_database()?;
        Self::check_provider(&conn, embedder.name())?;
        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
        })
    }

    fn check_provider(conn: &Connection, provider: &str) -> Result<()> {
        match db::schema::get_embedding_provider(conn)? {
            Some(stored) if stored != provider => {
                tracing::warn!(
                    stored = %stored,
                    configured = %provider,
                    "embedding provider changed; similarity scores against older records will be meaningless"
                );
            }
            Some(_) => {}
            None => db::schema::set_embedding_provider(conn, provider)?,
        }
        Ok(())
    }

    /// A panic while the lock was held leaves the connection usable: an unfinished
    /// transaction is rolled back when it is dropped during unwinding.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl VectorStore for SqliteVecStore {
    fn add(&self, id: &str, content: &str, metadata: &Metadata) -> Result<()> {
        let embedding = self.embedder.embed(content).context("embedding failed")?;
        let metadata_json = serde_json::to_string(metadata)?;
        let now = chrono::Utc::now();
        let timestamp =
            timestamp_seconds(metadata).unwrap_or(now.timestamp_micros() as f64 / 1_000_000.0);

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO memories (id, content, metadata, timestamp, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, content, metadata_json, timestamp, now.to_rfc3339()],
        )?;
        tx.execute(
            "INSERT INTO memories_vec (id, embedding) VALUES (?1, ?2)",
            params![id, super::embedding_to_bytes(&embedding)],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn similarity_query(&self, text: &str, k: usize) -> Result<Vec<(MemoryRecord, Option<f64>)>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(KNN_MAX);
        let embedding = self.embedder.embed(text).context("embedding failed")?;

        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, distance FROM memories_vec \
             WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
        )?;
        let ranked: Vec<(String, f64)> = stmt
            .query_map(
                params![super::embedding_to_bytes(&embedding), k as i64],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        let mut records = fetch_records(&conn, &ids)?;

        // Preserve KNN order; skip vectors whose row vanished.
        Ok(ranked
            .iter()
            .filter_map(|(id, l2)| {
                let pos = records.iter().position(|r| &r.id == id)?;
                Some((records.swap_remove(pos), Some(l2 * l2 / 2.0)))
            })
            .collect())
    }

    fn filtered_get(&self, filter: &StoreFilter, limit: Option<usize>) -> Result<Vec<MemoryRecord>> {
        let mut values: Vec<SqlValue> = Vec::new();
        let where_clause = match filter {
            StoreFilter::All => String::new(),
            StoreFilter::AnyTag(tags) => {
                if tags.is_empty() {
                    return Ok(Vec::new());
                }
                let placeholders: Vec<String> = (1..=tags.len()).map(|i| format!("?{i}")).collect();
                values.extend(tags.iter().cloned().map(SqlValue::Text));
                format!(
                    "WHERE EXISTS (SELECT 1 FROM json_each(m.metadata, '$.tags') t \
                     WHERE t.value IN ({}))",
                    placeholders.join(", ")
                )
            }
            StoreFilter::TimestampAtLeast(cutoff) => {
                values.push(SqlValue::Real(*cutoff));
                "WHERE m.timestamp >= ?1".to_string()
            }
        };
        // Negative LIMIT means unbounded in SQLite.
        let limit = limit
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let sql = format!(
            "SELECT m.id, m.content, m.metadata FROM memories m {where_clause} \
             ORDER BY m.rowid LIMIT {limit}"
        );

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values.iter()), row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn delete(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut removed = 0;
        for id in ids {
            removed += tx.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
            tx.execute("DELETE FROM memories_vec WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    fn heartbeat(&self) -> Result<i64> {
        let conn = self.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        let now = chrono::Utc::now();
        Ok(now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp_micros()))
    }

    fn count(&self) -> Result<u64> {
        let conn = self.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryRecord> {
    let metadata_str: String = row.get(2)?;
    Ok(MemoryRecord {
        id: row.get(0)?,
        content: row.get(1)?,
        metadata: serde_json::from_str(&metadata_str).unwrap_or_default(),
    })
}

/// Batch-fetch records by ids (unordered).
fn fetch_records(conn: &Connection, ids: &[&str]) -> Result<Vec<MemoryRecord>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT id, content, metadata FROM memories WHERE id IN ({})",
        placeholders.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map(params_from_iter(ids.iter()), row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
