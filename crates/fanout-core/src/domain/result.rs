//! Result model: the outcome contract of one task.
//!
//! This module is architecture-agnostic: it does not know about batches,
//! waves, or breakers. It only defines the "shape" of what a caller gets back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Error message for a task rejected by the per-task breaker check.
pub const CIRCUIT_OPEN_MESSAGE: &str = "Circuit breaker is open";

/// Error message for every task of a call rejected up front.
pub const CIRCUIT_OPEN_BATCH_MESSAGE: &str = "Circuit breaker is open - too many failures";

/// Task id used when a worker dies before it could report which task it ran.
pub const UNKNOWN_TASK_ID: &str = "unknown";

/// Outcome of one task after its whole retry sequence.
///
/// Created once per task per `execute_parallel` call and never mutated after
/// it is handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult<R> {
    pub task_id: String,
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Retry attempts actually consumed (0 when the first attempt succeeded).
    pub retries: u32,

    /// Wall-clock time of the whole retry sequence.
    #[serde(rename = "duration_ms", with = "crate::config::duration_ms")]
    pub duration: Duration,
}

impl<R> ExecutionResult<R> {
    pub fn success(task_id: impl Into<String>, result: R, retries: u32) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            result: Some(result),
            error: None,
            retries,
            duration: Duration::ZERO,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>, retries: u32) -> Self {
        Self {
            task_id: task_id.into(),
            success: false,
            result: None,
            error: Some(error.into()),
            retries,
            duration: Duration::ZERO,
        }
    }

    /// Rejected by the breaker without invoking the executor.
    pub fn rejected(task_id: impl Into<String>, message: &str) -> Self {
        Self::failure(task_id, message, 0)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Aggregate counts over a list of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_retries: u64,
}

impl ExecutionSummary {
    pub fn from_results<R>(results: &[ExecutionResult<R>]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            if r.success {
                acc.succeeded += 1;
            } else {
                acc.failed += 1;
            }
            acc.total_retries += u64::from(r.retries);
            acc
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_result_has_no_retries_and_no_duration() {
        let r: ExecutionResult<()> = ExecutionResult::rejected("t1", CIRCUIT_OPEN_MESSAGE);
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("Circuit breaker is open"));
        assert_eq!(r.retries, 0);
        assert_eq!(r.duration, Duration::ZERO);
        assert!(r.result.is_none());
    }

    #[test]
    fn result_serializes_duration_in_millis() {
        let r = ExecutionResult::success("t1", 42, 1).with_duration(Duration::from_millis(1500));
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["task_id"], "t1");
        assert_eq!(v["result"], 42);
        assert_eq!(v["duration_ms"], 1500);
        assert!(v.get("error").is_none());
    }

    #[test]
    fn summary_counts_successes_failures_and_retries() {
        let results = vec![
            ExecutionResult::success("a", (), 0),
            ExecutionResult::success("b", (), 2),
            ExecutionResult::failure("c", "boom", 3),
        ];
        let summary = ExecutionSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_retries, 5);
        assert!(!summary.all_succeeded());
    }
}
