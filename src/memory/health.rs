//! Health reporting: liveness check plus the rolling latency average.

use serde::Serialize;

use crate::memory::adapter::VectorStoreAdapter;
use crate::memory::latency::LatencyTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    /// Raw liveness value; absent when the check failed.
    pub heartbeat: Option<i64>,
    /// 100 when healthy, 0 otherwise.
    pub health: u8,
    pub avg_query_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Check the store. Never fails: a liveness fault is reported as unhealthy.
pub fn check_health(store: &VectorStoreAdapter, latency: &LatencyTracker) -> HealthStatus {
    let avg_query_time = latency.average();
    match store.liveness() {
        Ok(beat) if beat > 0 => HealthStatus {
            status: HealthState::Healthy,
            heartbeat: Some(beat),
            health: 100,
            avg_query_time,
            error: None,
        },
        Ok(beat) => HealthStatus {
            status: HealthState::Unhealthy,
            heartbeat: Some(beat),
            health: 0,
            avg_query_time,
            error: None,
        },
        Err(failure) => {
            tracing::warn!(error = %failure.message, "liveness check failed");
            HealthStatus {
                status: HealthState::Unhealthy,
                heartbeat: None,
                health: 0,
                avg_query_time,
                error: Some(failure.message),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::{StoreFilter, VectorStore};
    use crate::memory::types::{Metadata, MemoryRecord};
    use std::sync::Arc;

    struct Heartbeat(Option<i64>);

    impl VectorStore for Heartbeat {
        fn add(&self, _: &str, _: &str, _: &Metadata) -> anyhow::Result<()> {
            Ok(())
        }
        fn similarity_query(
            &self,
            _: &str,
            _: usize,
        ) -> anyhow::Result<Vec<(MemoryRecord, Option<f64>)>> {
            Ok(Vec::new())
        }
        fn filtered_get(&self, _: &StoreFilter, _: Option<usize>) -> anyhow::Result<Vec<MemoryRecord>> {
            Ok(Vec::new())
        }
        fn delete(&self, _: &[String]) -> anyhow::Result<usize> {
            Ok(0)
        }
        fn heartbeat(&self) -> anyhow::Result<i64> {
            self.0.ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
        fn count(&self) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    fn adapter(beat: Option<i64>) -> VectorStoreAdapter {
        VectorStoreAdapter::new(Arc::new(Heartbeat(beat)))
    }

    #[test]
    fn positive_heartbeat_is_healthy() {
        let latency = LatencyTracker::new();
        latency.record(10.0);
        latency.record(20.0);
        let status = check_health(&adapter(Some(1_700_000_000)), &latency);
        assert_eq!(status.status, HealthState::Healthy);
        assert_eq!(status.health, 100);
        assert_eq!(status.heartbeat, Some(1_700_000_000));
        assert_eq!(status.avg_query_time, 15.0);
        assert!(status.error.is_none());
    }

    #[test]
    fn zero_heartbeat_is_unhealthy() {
        let status = check_health(&adapter(Some(0)), &LatencyTracker::new());
        assert_eq!(status.status, HealthState::Unhealthy);
        assert_eq!(status.health, 0);
    }

    #[test]
    fn liveness_failure_keeps_latency_and_message() {
        let latency = LatencyTracker::new();
        latency.record(12.5);
        let status = check_health(&adapter(None), &latency);
        assert_eq!(status.status, HealthState::Unhealthy);
        assert_eq!(status.heartbeat, None);
        assert_eq!(status.avg_query_time, 12.5);
        assert!(status.error.unwrap().contains("connection refused"));

        let json = serde_json::to_value(check_health(&adapter(None), &latency)).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["heartbeat"], serde_json::Value::Null);
    }
}
