//! Translation layer between handlers and the store collaborator.
//!
//! Generates ids, turns distances into similarity scores, and converts every
//! store fault into a [`StoreFailure`]. Nothing is retried.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreFailure;
use crate::memory::store::{StoreFilter, VectorStore};
use crate::memory::types::{Metadata, MemoryRecord};

/// A memory as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryHit {
    pub id: String,
    pub content: String,
    pub tags: Vec<String>,
    pub metadata: Metadata,
    /// Present only for ranked similarity results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl MemoryHit {
    fn unranked(record: MemoryRecord) -> Self {
        Self {
            tags: record.tags(),
            id: record.id,
            content: record.content,
            metadata: record.metadata,
            similarity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredMemory {
    pub id: String,
    /// The metadata `timestamp` as stored: RFC 3339 text or Unix seconds.
    pub timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_memories: u64,
    pub unique_tags: usize,
}

/// `1 - distance`, clamped to `[0, 1]`. Unknown distances score 0.
pub fn similarity_from_distance(distance: Option<f64>) -> f64 {
    match distance {
        Some(d) if d.is_finite() => (1.0 - d).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[derive(Clone)]
pub struct VectorStoreAdapter {
    store: Arc<dyn VectorStore>,
}

impl VectorStoreAdapter {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Add a record under a fresh UUID v7. `metadata` must already be prepared.
    pub fn add(&self, content: &str, metadata: &Metadata) -> Result<StoredMemory, StoreFailure> {
        let id = uuid::Uuid::now_v7().to_string();
        self.store
            .add(&id, content, metadata)
            .map_err(|e| failure("add", e))?;
        Ok(StoredMemory {
            id,
            timestamp: metadata.get("timestamp").cloned(),
        })
    }

    pub fn similarity_search(&self, text: &str, k: usize) -> Result<Vec<MemoryHit>, StoreFailure> {
        let ranked = self
            .store
            .similarity_query(text, k)
            .map_err(|e| failure("similarity_query", e))?;
        Ok(ranked
            .into_iter()
            .map(|(record, distance)| MemoryHit {
                similarity: Some(similarity_from_distance(distance)),
                ..MemoryHit::unranked(record)
            })
            .collect())
    }

    pub fn filtered(
        &self,
        filter: &StoreFilter,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryHit>, StoreFailure> {
        let records = self
            .store
            .filtered_get(filter, limit)
            .map_err(|e| failure("filtered_get", e))?;
        Ok(records.into_iter().map(MemoryHit::unranked).collect())
    }

    pub fn delete(&self, ids: &[String]) -> Result<usize, StoreFailure> {
        self.store.delete(ids).map_err(|e| failure("delete", e))
    }

    pub fn liveness(&self) -> Result<i64, StoreFailure> {
        self.store.heartbeat().map_err(|e| failure("heartbeat", e))
    }

    /// Record count and number of distinct tags across all records.
    pub fn stats(&self) -> Result<StoreStats, StoreFailure> {
        let total_memories = self.store.count().map_err(|e| failure("count", e))?;
        let records = self
            .store
            .filtered_get(&StoreFilter::All, None)
            .map_err(|e| failure("filtered_get", e))?;
        let unique: BTreeSet<String> = records.iter().flat_map(MemoryRecord::tags).collect();
        Ok(StoreStats {
            total_memories,
            unique_tags: unique.len(),
        })
    }
}

fn failure(primitive: &'static str, err: anyhow::Error) -> StoreFailure {
    let failure = StoreFailure::from(err);
    tracing::error!(primitive, error = %failure.message, "store call failed");
    failure
}
