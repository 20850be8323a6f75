//! Metrics collection for one executor instance.
//!
//! Counters are updated once per finished task. Snapshots are owned copies:
//! observers and getters never see a reference into the live counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::ExecutionResult;
use crate::resilience::{CircuitState, RateLimitSnapshot};

/// Aggregated executor metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_executed: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_retries: u64,
    /// Running mean of task durations, in milliseconds.
    pub average_duration_ms: f64,
    /// Max simultaneously-active tasks observed since the last reset.
    pub peak_concurrency: usize,
    pub circuit_breaker_status: CircuitState,
    pub rate_limit: RateLimitSnapshot,
}

#[derive(Debug, Default)]
struct Counters {
    total_executed: u64,
    success_count: u64,
    failure_count: u64,
    total_retries: u64,
    average_duration_ms: f64,
    peak_concurrency: usize,
}

/// Counters plus the active-worker gauge.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: Mutex<Counters>,
    active: AtomicUsize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one task active. Returns the new active count.
    pub fn task_started(&self) -> usize {
        let current = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let mut counters = self.counters.lock();
        if current > counters.peak_concurrency {
            counters.peak_concurrency = current;
        }
        current
    }

    pub fn task_finished(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Fold one finished task into the counters.
    pub fn record<R>(&self, result: &ExecutionResult<R>) {
        let mut c = self.counters.lock();
        c.total_executed += 1;
        if result.success {
            c.success_count += 1;
        } else {
            c.failure_count += 1;
        }
        c.total_retries += u64::from(result.retries);

        let n = c.total_executed as f64;
        let duration_ms = duration_as_ms(result.duration);
        c.average_duration_ms = (c.average_duration_ms * (n - 1.0) + duration_ms) / n;
    }

    /// Zero every counter. The active gauge tracks live work and is left alone.
    pub fn reset(&self) {
        *self.counters.lock() = Counters::default();
    }

    pub fn snapshot(
        &self,
        circuit_breaker_status: CircuitState,
        rate_limit: RateLimitSnapshot,
    ) -> MetricsSnapshot {
        let c = self.counters.lock();
        MetricsSnapshot {
            total_executed: c.total_executed,
            success_count: c.success_count,
            failure_count: c.failure_count,
            total_retries: c.total_retries,
            average_duration_ms: c.average_duration_ms,
            peak_concurrency: c.peak_concurrency,
            circuit_breaker_status,
            rate_limit,
        }
    }
}

fn duration_as_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(m: &MetricsCollector) -> MetricsSnapshot {
        m.snapshot(CircuitState::Closed, RateLimitSnapshot::default())
    }

    #[test]
    fn record_updates_counters_and_running_mean() {
        let m = MetricsCollector::new();
        m.record(&ExecutionResult::success("a", (), 0).with_duration(Duration::from_millis(100)));
        m.record(&ExecutionResult::<()>::failure("b", "x", 2).with_duration(Duration::from_millis(300)));

        let s = snap(&m);
        assert_eq!(s.total_executed, 2);
        assert_eq!(s.success_count, 1);
        assert_eq!(s.failure_count, 1);
        assert_eq!(s.total_retries, 2);
        assert!((s.average_duration_ms - 200.0).abs() < 1e-9);
    }

    #[test]
    fn peak_tracks_the_highest_active_count() {
        let m = MetricsCollector::new();
        m.task_started();
        m.task_started();
        m.task_finished();
        m.task_started();
        assert_eq!(m.active(), 2);
        assert_eq!(snap(&m).peak_concurrency, 2);

        m.task_started();
        assert_eq!(snap(&m).peak_concurrency, 3);
    }

    #[test]
    fn reset_zeroes_counters_but_not_the_gauge() {
        let m = MetricsCollector::new();
        m.task_started();
        m.record(&ExecutionResult::success("a", (), 1));
        m.reset();

        let s = snap(&m);
        assert_eq!(s.total_executed, 0);
        assert_eq!(s.total_retries, 0);
        assert_eq!(s.peak_concurrency, 0);
        assert_eq!(m.active(), 1);
    }

    #[test]
    fn snapshot_serializes_breaker_status() {
        let m = MetricsCollector::new();
        let s = m.snapshot(CircuitState::Open, RateLimitSnapshot::default());
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["circuit_breaker_status"], "open");
        assert_eq!(v["rate_limit"]["max"], 0);
    }
}
