//! Wave orchestration - 依存順に分割された wave を順番に流す
//!
//! 依存関係の解決は呼び出し側の責務。wave `k` のタスクは wave `k+1` 以降に
//! 依存しないように分割して渡す。

use std::sync::Arc;

use super::dispatcher::{ParallelExecutor, SharedProgress};
use crate::config::ExecutorConfig;
use crate::domain::{ExecutionResult, ExecutorError, Task};
use crate::ports::{TaskExecutor, WaveObserver};

/// Run every wave through one fresh executor built from `config`.
///
/// Breaker and rate-limiter state carry over from wave to wave. A failed wave
/// never stops the next one; the only error is an invalid `config`.
pub async fn execute_in_waves<T, E>(
    waves: Vec<Vec<T>>,
    executor: Arc<E>,
    config: ExecutorConfig,
    on_wave_complete: Option<&dyn WaveObserver<E::Output>>,
    on_progress: Option<SharedProgress<E::Output>>,
) -> Result<Vec<ExecutionResult<E::Output>>, ExecutorError>
where
    T: Task,
    E: TaskExecutor<T>,
{
    let parallel = ParallelExecutor::new(config)?;
    Ok(parallel
        .execute_waves(waves, executor, on_wave_complete, on_progress)
        .await)
}
