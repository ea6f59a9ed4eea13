//! Request dispatcher: validate, route, and normalize one operation call.
//!
//! Store failures surface in two ways, kept for compatibility with existing
//! dashboard callers. `store_memory`, `retrieve_memory`, `search_by_tag`,
//! `delete_by_tag`, and `recall_memory` fail the call with
//! [`DispatchError::Store`]. `dashboard_recall_memory`, `get_stats`, both health
//! checks, `delete_memory`, and `create_backup` succeed with an `error` or
//! `status` field in the payload instead.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::delete_by_tag::DeleteByTagParams;
use super::delete_memory::DeleteMemoryParams;
use super::recall_memory::RecallMemoryParams;
use super::registry::{self, ToolDescriptor};
use super::retrieve_memory::RetrieveMemoryParams;
use super::search_by_tag::SearchByTagParams;
use super::store_memory::StoreMemoryParams;
use super::Operation;
use crate::error::{DispatchError, DispatchResult};
use crate::memory::adapter::VectorStoreAdapter;
use crate::memory::backup::BackupManager;
use crate::memory::health::check_health;
use crate::memory::latency::LatencyTracker;
use crate::memory::store::{StoreFilter, VectorStore};
use crate::memory::tags::TagFilter;
use crate::memory::temporal::parse_temporal;
use crate::memory::types::prepare_metadata;

pub struct Dispatcher {
    store: VectorStoreAdapter,
    latency: Arc<LatencyTracker>,
    backups: BackupManager,
    default_n_results: usize,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn VectorStore>,
        latency: Arc<LatencyTracker>,
        backups: BackupManager,
    ) -> Self {
        Self {
            store: VectorStoreAdapter::new(store),
            latency,
            backups,
            default_n_results: 5,
        }
    }

    pub fn with_default_n_results(mut self, n: usize) -> Self {
        self.default_n_results = n;
        self
    }

    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    /// The registry catalog.
    pub fn list_tools(&self) -> &'static [ToolDescriptor] {
        registry::catalog()
    }

    /// Run one operation and return its JSON payload.
    ///
    /// Panics inside a handler are caught here; the dispatcher stays usable.
    pub fn dispatch(&self, name: &str, args: Option<Map<String, Value>>) -> DispatchResult<String> {
        let op: Operation = name
            .parse()
            .map_err(|_| DispatchError::UnknownOperation(name.to_string()))?;
        let args = args.unwrap_or_default();
        validate_required(op, &args)?;

        tracing::info!(operation = %op, "dispatching");
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.route(op, args)))
            .unwrap_or_else(|payload| {
                Err(DispatchError::Internal {
                    operation: op.as_str(),
                    reason: panic_message(payload.as_ref()),
                })
            });

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match outcome {
            Ok(value) => {
                tracing::debug!(operation = %op, elapsed_ms, "operation complete");
                serde_json::to_string(&value).map_err(|e| DispatchError::Internal {
                    operation: op.as_str(),
                    reason: format!("serialization failed: {e}"),
                })
            }
            Err(e) => {
                tracing::warn!(operation = %op, elapsed_ms, error = %e, "operation failed");
                Err(e)
            }
        }
    }

    fn route(&self, op: Operation, args: Map<String, Value>) -> DispatchResult<Value> {
        match op {
            Operation::StoreMemory => self.store_memory(parse(op, args)?),
            Operation::RetrieveMemory => self.retrieve_memory(parse(op, args)?),
            Operation::SearchByTag => self.search_by_tag(parse(op, args)?),
            Operation::RecallMemory | Operation::DashboardRecallMemory => {
                self.recall_memory(op, parse(op, args)?)
            }
            Operation::DeleteMemory => self.delete_memory(parse(op, args)?),
            Operation::DeleteByTag => self.delete_by_tag(parse(op, args)?),
            Operation::CheckDatabaseHealth | Operation::DashboardCheckHealth => {
                to_json(op, &check_health(&self.store, &self.latency))
            }
            Operation::GetStats => Ok(self.get_stats()),
            Operation::OptimizeDb => Ok(json!({
                "status": "not_implemented",
                "message": "Database optimization is not implemented"
            })),
            Operation::CreateBackup => to_json(op, &self.backups.create_backup()),
        }
    }

    fn store_memory(&self, params: StoreMemoryParams) -> DispatchResult<Value> {
        let content = require(Operation::StoreMemory, "content", params.content)?;
        let metadata = match params.metadata {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(invalid(
                    Operation::StoreMemory,
                    format!("metadata must be an object, got {other}"),
                ))
            }
        };
        let metadata = prepare_metadata(metadata, Utc::now())
            .map_err(|reason| invalid(Operation::StoreMemory, reason))?;

        let stored = self.store.add(&content, &metadata)?;
        tracing::info!(id = %stored.id, content_len = content.len(), "memory stored");
        Ok(json!({
            "status": "success",
            "id": stored.id,
            "timestamp": stored.timestamp,
            "message": "Successfully stored memory",
        }))
    }

    fn retrieve_memory(&self, params: RetrieveMemoryParams) -> DispatchResult<Value> {
        let query = require(Operation::RetrieveMemory, "query", params.query)?;
        let n = params.n_results.unwrap_or(self.default_n_results);
        if n == 0 {
            return Ok(json!({ "memories": [] }));
        }
        let hits = self
            .latency
            .measure(|| self.store.similarity_search(&query, n))?;
        tracing::info!(results = hits.len(), "retrieve_memory complete");
        Ok(json!({ "memories": hits }))
    }

    fn search_by_tag(&self, params: SearchByTagParams) -> DispatchResult<Value> {
        let tags = require(Operation::SearchByTag, "tags", params.tags)?;
        let Some(filter) = TagFilter::build(&tags).to_store_filter() else {
            tracing::debug!("no usable tags, skipping store");
            return Ok(json!({ "memories": [] }));
        };
        let hits = self.store.filtered(&filter, None)?;
        tracing::info!(results = hits.len(), "search_by_tag complete");
        Ok(json!({ "memories": hits }))
    }

    /// Time-filtered listing when the query names a period, ranked search otherwise.
    fn recall_memory(&self, op: Operation, params: RecallMemoryParams) -> DispatchResult<Value> {
        let embed_errors = op == Operation::DashboardRecallMemory;
        let query = require(op, "query", params.query)?;
        let n = params.n_results.unwrap_or(self.default_n_results);
        let parsed = parse_temporal(&query, Utc::now());
        if n == 0 {
            return Ok(json!({
                "memories": [],
                "query": parsed.cleaned,
                "time_filter": parsed.phrase,
            }));
        }

        let result = self.latency.measure(|| match parsed.cutoff {
            Some(cutoff) => {
                let seconds = cutoff.timestamp_micros() as f64 / 1_000_000.0;
                self.store
                    .filtered(&StoreFilter::TimestampAtLeast(seconds), Some(n))
            }
            None => self.store.similarity_search(&parsed.cleaned, n),
        });

        match result {
            Ok(hits) => {
                tracing::info!(
                    results = hits.len(),
                    time_filter = parsed.phrase.unwrap_or("none"),
                    "recall complete"
                );
                Ok(json!({
                    "memories": hits,
                    "query": parsed.cleaned,
                    "time_filter": parsed.phrase,
                }))
            }
            Err(failure) if embed_errors => {
                tracing::warn!(error = %failure.message, "recall failed, reporting in payload");
                Ok(json!({
                    "memories": [],
                    "query": parsed.cleaned,
                    "time_filter": parsed.phrase,
                    "error": failure.message,
                }))
            }
            Err(failure) => Err(failure.into()),
        }
    }

    fn delete_memory(&self, params: DeleteMemoryParams) -> DispatchResult<Value> {
        let id = require(Operation::DeleteMemory, "memory_id", params.memory_id)?;
        Ok(match self.store.delete(std::slice::from_ref(&id)) {
            Ok(0) => json!({
                "status": "not_found",
                "message": format!("Memory {id} not found"),
            }),
            Ok(_) => json!({
                "status": "success",
                "message": format!("Memory {id} deleted successfully"),
            }),
            Err(failure) => json!({
                "status": "error",
                "message": failure.message,
            }),
        })
    }

    /// Enumerate matching ids, then delete exactly those. Records inserted
    /// between the two steps are not deleted.
    fn delete_by_tag(&self, params: DeleteByTagParams) -> DispatchResult<Value> {
        let tag = require(Operation::DeleteByTag, "tag", params.tag)?
            .trim()
            .to_string();
        let ids: Vec<String> = match TagFilter::build(&[&tag]).to_store_filter() {
            Some(filter) => self
                .store
                .filtered(&filter, None)?
                .into_iter()
                .map(|hit| hit.id)
                .collect(),
            None => Vec::new(),
        };

        if ids.is_empty() {
            return Ok(json!({
                "deleted_count": 0,
                "message": format!("No memories found with tag '{tag}'"),
            }));
        }

        let deleted = self.store.delete(&ids)?;
        tracing::info!(tag = %tag, deleted, "delete_by_tag complete");
        Ok(json!({
            "deleted_count": deleted,
            "message": format!("Successfully deleted {deleted} memories with tag '{tag}'"),
        }))
    }

    fn get_stats(&self) -> Value {
        match self.store.stats() {
            Ok(stats) => json!({
                "total_memories": stats.total_memories,
                "unique_tags": stats.unique_tags,
            }),
            Err(failure) => json!({
                "total_memories": 0,
                "unique_tags": 0,
                "error": failure.message,
            }),
        }
    }
}

/// Absent, `null`, or blank-string required fields are missing. Lists are not
/// checked for emptiness here.
fn validate_required(op: Operation, args: &Map<String, Value>) -> DispatchResult<()> {
    for field in &registry::descriptor(op).required {
        let missing = match args.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(DispatchError::MissingArgument {
                operation: op.as_str(),
                argument: field.clone(),
            });
        }
    }
    Ok(())
}

/// Unwrap a required field after schema validation. Still checked so a typed
/// handler never sees a hole.
fn require<T>(op: Operation, field: &str, value: Option<T>) -> DispatchResult<T> {
    value.ok_or_else(|| DispatchError::MissingArgument {
        operation: op.as_str(),
        argument: field.to_string(),
    })
}

fn parse<T: DeserializeOwned>(op: Operation, args: Map<String, Value>) -> DispatchResult<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| invalid(op, e.to_string()))
}

fn to_json<T: Serialize>(op: Operation, value: &T) -> DispatchResult<Value> {
    serde_json::to_value(value).map_err(|e| DispatchError::Internal {
        operation: op.as_str(),
        reason: format!("serialization failed: {e}"),
    })
}

fn invalid(op: Operation, reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidArgument {
        operation: op.as_str(),
        reason: reason.into(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_string()
    }
}
