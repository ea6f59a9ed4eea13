#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use memdash::embedding::hashed::HashedEmbeddingProvider;
use memdash::memory::backup::BackupManager;
use memdash::memory::latency::LatencyTracker;
use memdash::memory::store::{SqliteVecStore, StoreFilter, VectorStore};
use memdash::memory::types::{Metadata, MemoryRecord};
use memdash::tools::Dispatcher;
use serde_json::Value;
use tempfile::TempDir;

/// A persisted store in a temp dir, embedded with the hashed provider.
pub struct TestEnv {
    pub dir: TempDir,
    pub dispatcher: Dispatcher,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store_dir = dir.path().join("store");
        let store = SqliteVecStore::open(&store_dir, Arc::new(HashedEmbeddingProvider)).unwrap();
        let dispatcher = Dispatcher::new(
            Arc::new(store),
            Arc::new(LatencyTracker::new()),
            BackupManager::new(&store_dir, dir.path().join("backups")),
        );
        Self { dir, dispatcher }
    }

    pub fn call(&self, name: &str, args: Value) -> Value {
        let body = self.dispatcher.dispatch(name, into_args(args)).unwrap();
        serde_json::from_str(&body).unwrap()
    }
}

pub fn into_args(args: Value) -> Option<serde_json::Map<String, Value>> {
    match args {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// In-memory fake that counts primitive calls. Optionally fails every call or
/// just the heartbeat.
#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<Vec<MemoryRecord>>,
    pub calls: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_all: bool,
    pub fail_heartbeat: bool,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            anyhow::bail!("store unavailable");
        }
        Ok(())
    }
}

impl VectorStore for FakeStore {
    fn add(&self, id: &str, content: &str, metadata: &Metadata) -> anyhow::Result<()> {
        self.enter()?;
        self.records.lock().unwrap().push(MemoryRecord {
            id: id.to_string(),
            content: content.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }

    fn similarity_query(&self, _text: &str, k: usize) -> anyhow::Result<Vec<(MemoryRecord, Option<f64>)>> {
        self.enter()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .take(k)
            .cloned()
            .map(|r| (r, Some(0.25)))
            .collect())
    }

    fn filtered_get(&self, filter: &StoreFilter, limit: Option<usize>) -> anyhow::Result<Vec<MemoryRecord>> {
        self.enter()?;
        let records = self.records.lock().unwrap();
        let matching = records.iter().filter(|r| match filter {
            StoreFilter::All => true,
            StoreFilter::AnyTag(tags) => r.tags().iter().any(|t| tags.contains(t)),
            StoreFilter::TimestampAtLeast(_) => true,
        });
        Ok(matching.take(limit.unwrap_or(usize::MAX)).cloned().collect())
    }

    fn delete(&self, ids: &[String]) -> anyhow::Result<usize> {
        self.enter()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| !ids.contains(&r.id));
        Ok(before - records.len())
    }

    fn heartbeat(&self) -> anyhow::Result<i64> {
        self.enter()?;
        if self.fail_heartbeat {
            anyhow::bail!("heartbeat timed out");
        }
        Ok(1)
    }

    fn count(&self) -> anyhow::Result<u64> {
        self.enter()?;
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

/// Dispatcher over a shared fake; backups point at a directory that does not exist.
pub fn fake_dispatcher(store: Arc<FakeStore>) -> (Dispatcher, Arc<LatencyTracker>) {
    let latency = Arc::new(LatencyTracker::new());
    let dispatcher = Dispatcher::new(
        store,
        Arc::clone(&latency),
        BackupManager::new("/nonexistent/memdash/store", "/nonexistent/memdash/backups"),
    );
    (dispatcher, latency)
}
