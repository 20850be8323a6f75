//! Simulated task executor driven by the task payload.
//!
//! Payload fields:
//! - `work_ms`: latency of each attempt
//! - `fail_times`: number of leading attempts that fail

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fanout_core::{TaskExecutor, TaskFailure, TaskSpec};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct SimulatedWork {
    #[serde(default)]
    work_ms: u64,
    #[serde(default)]
    fail_times: u32,
}

#[derive(Default)]
pub struct SimulatedExecutor {
    attempts: Mutex<HashMap<String, u32>>,
}

#[async_trait]
impl TaskExecutor<TaskSpec> for SimulatedExecutor {
    type Output = serde_json::Value;

    async fn execute(&self, task: &TaskSpec) -> Result<serde_json::Value, TaskFailure> {
        let work: SimulatedWork = if task.payload.is_null() {
            SimulatedWork::default()
        } else {
            serde_json::from_value(task.payload.clone())
                .map_err(|e| TaskFailure::new(format!("invalid payload: {e}")))?
        };

        let attempt = {
            let mut attempts = self
                .attempts
                .lock()
                .map_err(|_| TaskFailure::new("attempt counter poisoned"))?;
            let n = attempts.entry(task.id.clone()).or_insert(0);
            *n += 1;
            *n
        };

        tokio::time::sleep(Duration::from_millis(work.work_ms)).await;

        if attempt <= work.fail_times {
            return Err(TaskFailure::new(format!(
                "simulated failure {attempt}/{}",
                work.fail_times
            )));
        }

        Ok(serde_json::json!({ "task": task.id, "attempt": attempt }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fails_the_configured_number_of_times_then_succeeds() {
        let exec = SimulatedExecutor::default();
        let task = TaskSpec::new("t").with_payload(serde_json::json!({ "fail_times": 2 }));

        assert!(exec.execute(&task).await.is_err());
        assert!(exec.execute(&task).await.is_err());
        let ok = exec.execute(&task).await.unwrap();
        assert_eq!(ok["attempt"], 3);
    }

    #[tokio::test]
    async fn null_payload_succeeds_immediately() {
        let exec = SimulatedExecutor::default();
        assert!(exec.execute(&TaskSpec::new("t")).await.is_ok());
    }

    #[tokio::test]
    async fn malformed_payload_is_a_task_failure() {
        let exec = SimulatedExecutor::default();
        let task = TaskSpec::new("t").with_payload(serde_json::json!({ "work_ms": "slow" }));
        let err = exec.execute(&task).await.unwrap_err();
        assert!(err.message().contains("invalid payload"));
    }
}
