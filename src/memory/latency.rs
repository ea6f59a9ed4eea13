//! Rolling latency window for query and recall operations.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

/// Number of most recent durations kept.
pub const LATENCY_WINDOW: usize = 50;

/// Bounded FIFO of store-call durations in milliseconds.
///
/// One instance is shared by every handler of a dispatcher. Appends and reads
/// are serialized through a mutex so concurrent transports don't lose updates.
#[derive(Debug, Default)]
pub struct LatencyTracker {
    window: Mutex<VecDeque<f64>>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
        }
    }

    /// Push a duration, evicting the oldest entry once the window is full.
    pub fn record(&self, duration_ms: f64) {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.len() == LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(duration_ms);
    }

    /// Mean of the window rounded to 2 decimals, or 0 when empty.
    pub fn average(&self) -> f64 {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            return 0.0;
        }
        let mean = window.iter().sum::<f64>() / window.len() as f64;
        (mean * 100.0).round() / 100.0
    }

    pub fn len(&self) -> usize {
        self.window.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` and record its wall-clock time if it succeeds.
    pub fn measure<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let started = Instant::now();
        let result = f()?;
        self.record(started.elapsed().as_secs_f64() * 1000.0);
        Ok(result)
    }
}
