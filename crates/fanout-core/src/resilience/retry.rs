//! Retry policy: runs one task up to `max_retries + 1` times with backoff.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::domain::{ExecutionResult, Task, TaskFailure};
use crate::ports::TaskExecutor;

/// Retry policy for failed attempts.
///
/// The policy does not time the attempts: the returned result always carries
/// `duration = 0`, and the dispatcher fills in the wall-clock time of the
/// whole sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,

    /// Base delay before the first retry.
    pub retry_delay: Duration,

    pub exponential_backoff: bool,

    /// Cap applied to every computed delay.
    pub max_retry_delay: Option<Duration>,
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            exponential_backoff: config.exponential_backoff,
            max_retry_delay: config.max_retry_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (0-indexed).
    ///
    /// # Design note
    /// exponential: `retry_delay * 2^attempt`, otherwise flat `retry_delay`,
    /// then clamped to `max_retry_delay`.
    ///
    /// Example with retry_delay=1s, max_retry_delay=30s:
    /// - after attempt 0: 1s
    /// - after attempt 1: 2s
    /// - after attempt 2: 4s
    /// - after attempt 5: 30s (32s clamped)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
            self.retry_delay.saturating_mul(factor)
        } else {
            self.retry_delay
        };

        match self.max_retry_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Run `task` through `executor` until it succeeds or retries run out.
    pub async fn run<T, E>(&self, task: &T, executor: &E) -> ExecutionResult<E::Output>
    where
        T: Task,
        E: TaskExecutor<T> + ?Sized,
    {
        let mut last_failure = TaskFailure::new("task was never attempted");

        for attempt in 0..=self.max_retries {
            match executor.execute(task).await {
                Ok(output) => return ExecutionResult::success(task.id(), output, attempt),
                Err(failure) => {
                    if attempt < self.max_retries {
                        let delay = self.delay_for(attempt);
                        tracing::warn!(
                            task_id = task.id(),
                            attempt = attempt + 1,
                            max_attempts = self.max_retries + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %failure,
                            "Task attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_failure = failure;
                }
            }
        }

        tracing::warn!(
            task_id = task.id(),
            retries = self.max_retries,
            error = %last_failure,
            "Task failed after exhausting retries"
        );
        ExecutionResult::failure(task.id(), last_failure.message(), self.max_retries)
    }
}
