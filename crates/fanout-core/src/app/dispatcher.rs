//! ParallelExecutor - バッチ単位のワーカープール
//!
//! # フロー（1 タスクあたり）
//! 1. CircuitBreaker::can_execute() で再チェック
//! 2. SlidingWindowRateLimiter::acquire() で流量制御
//! 3. active gauge を増やす（peak_concurrency 用）
//! 4. RetryPolicy::run() で実行
//! 5. duration 記録 → metrics 更新 → breaker へ成功/失敗を通知
//! 6. progress callback → metrics observer
//! 7. active gauge を戻し、rate limiter に完了時刻を記録
//!
//! バッチ内は `JoinSet` で並行実行し、全タスクの完了を待ってから次のバッチへ進む。

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::task::JoinSet;
use tokio::time::Instant;

use super::status::ExecutorStatus;
use crate::config::ExecutorConfig;
use crate::domain::{
    CIRCUIT_OPEN_BATCH_MESSAGE, CIRCUIT_OPEN_MESSAGE, ExecutionResult, ExecutionSummary,
    ExecutorError, Task, UNKNOWN_TASK_ID,
};
use crate::observability::{MetricsCollector, MetricsSnapshot};
use crate::ports::{MetricsObserver, ProgressObserver, TaskExecutor, WaveObserver};
use crate::resilience::{CircuitBreaker, RetryPolicy, SlidingWindowRateLimiter};

/// Progress observer shared by every worker of one call.
pub type SharedProgress<R> = Arc<dyn ProgressObserver<R>>;

/// Executes task lists under a concurrency cap, a rate limit, retries, and a
/// circuit breaker.
///
/// Breaker, rate-limiter, and metrics state belong to the instance and
/// persist across calls, so one executor can drive several waves.
///
/// # 使用例
/// ```ignore
/// let executor = ParallelExecutor::new(ExecutorConfig::new(4))?;
/// let results = executor.execute_parallel(tasks, Arc::new(MyExecutor)).await;
/// ```
pub struct ParallelExecutor {
    shared: Arc<Shared>,
}

struct Shared {
    config: ExecutorConfig,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    limiter: SlidingWindowRateLimiter,
    metrics: MetricsCollector,
    metrics_observer: Option<Arc<dyn MetricsObserver>>,
}

impl ParallelExecutor {
    /// Validates `config` and builds a closed breaker and empty window.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate()?;

        let metrics_observer = config
            .metrics
            .as_ref()
            .filter(|m| m.enabled)
            .and_then(|m| m.on_metrics_update.clone());

        let shared = Shared {
            retry: RetryPolicy::from(config.retry),
            breaker: CircuitBreaker::new(config.circuit_breaker),
            limiter: SlidingWindowRateLimiter::new(config.rate_limit),
            metrics: MetricsCollector::new(),
            metrics_observer,
            config,
        };
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.shared.config
    }

    /// Run `tasks` and return one result per task.
    pub async fn execute_parallel<T, E>(
        &self,
        tasks: Vec<T>,
        executor: Arc<E>,
    ) -> Vec<ExecutionResult<E::Output>>
    where
        T: Task,
        E: TaskExecutor<T>,
    {
        self.execute_parallel_with_progress(tasks, executor, None)
            .await
    }

    /// Like [`execute_parallel`](Self::execute_parallel), reporting each
    /// finished task to `on_progress`.
    ///
    /// Results are grouped by batch; within a batch they arrive in completion
    /// order.
    pub async fn execute_parallel_with_progress<T, E>(
        &self,
        tasks: Vec<T>,
        executor: Arc<E>,
        on_progress: Option<SharedProgress<E::Output>>,
    ) -> Vec<ExecutionResult<E::Output>>
    where
        T: Task,
        E: TaskExecutor<T>,
    {
        let total = tasks.len();

        if !self.shared.breaker.can_execute() {
            tracing::warn!(
                tasks = total,
                "Circuit breaker open, rejecting all tasks without execution"
            );
            return tasks
                .iter()
                .map(|t| ExecutionResult::rejected(t.id(), CIRCUIT_OPEN_BATCH_MESSAGE))
                .collect();
        }

        let concurrency = self.shared.config.concurrency;
        let completed = Arc::new(AtomicUsize::new(0));
        let mut results = Vec::with_capacity(total);
        let mut pending = tasks.into_iter().peekable();
        let mut batch_index = 0usize;

        while pending.peek().is_some() {
            let batch: Vec<T> = pending.by_ref().take(concurrency).collect();
            tracing::debug!(batch = batch_index, size = batch.len(), total, "Dispatching batch");

            let mut workers = JoinSet::new();
            for task in batch {
                let shared = Arc::clone(&self.shared);
                let executor = Arc::clone(&executor);
                let on_progress = on_progress.clone();
                let completed = Arc::clone(&completed);
                workers.spawn(async move {
                    shared
                        .run_task(task, executor.as_ref(), on_progress.as_deref(), &completed, total)
                        .await
                });
            }

            // Batch barrier: every worker settles before the next batch starts.
            while let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        tracing::error!(error = %err, "Task worker failed unexpectedly");
                        results.push(ExecutionResult::failure(UNKNOWN_TASK_ID, err.to_string(), 0));
                    }
                }
            }
            batch_index += 1;
        }

        results
    }

    /// Run pre-ordered waves through this executor, one after another.
    ///
    /// A wave with failures is logged and the next wave still runs.
    /// `on_wave_complete` receives the 0-based wave index.
    pub async fn execute_waves<T, E>(
        &self,
        waves: Vec<Vec<T>>,
        executor: Arc<E>,
        on_wave_complete: Option<&dyn WaveObserver<E::Output>>,
        on_progress: Option<SharedProgress<E::Output>>,
    ) -> Vec<ExecutionResult<E::Output>>
    where
        T: Task,
        E: TaskExecutor<T>,
    {
        let wave_count = waves.len();
        let mut all_results = Vec::with_capacity(waves.iter().map(Vec::len).sum());

        for (index, wave) in waves.into_iter().enumerate() {
            tracing::info!(wave = index, of = wave_count, tasks = wave.len(), "Starting wave");

            let results = self
                .execute_parallel_with_progress(wave, Arc::clone(&executor), on_progress.clone())
                .await;

            if let Some(observer) = on_wave_complete {
                observer.on_wave_complete(index, &results);
            }

            let summary = ExecutionSummary::from_results(&results);
            if summary.all_succeeded() {
                tracing::info!(wave = index, succeeded = summary.succeeded, "Wave complete");
            } else {
                tracing::warn!(
                    wave = index,
                    failed = summary.failed,
                    succeeded = summary.succeeded,
                    "Wave finished with failures, continuing"
                );
            }

            all_results.extend(results);
        }

        all_results
    }

    pub fn status(&self) -> ExecutorStatus {
        let shared = &self.shared;
        ExecutorStatus {
            concurrency: shared.config.concurrency,
            active_workers: shared.metrics.active(),
            priority_enabled: shared.config.enable_priority,
            circuit_breaker: shared.breaker.snapshot(),
            rate_limit: shared.limiter.snapshot(),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics_snapshot()
    }

    /// Zero the counters. The breaker keeps its state.
    pub fn reset_metrics(&self) {
        self.shared.metrics.reset();
        tracing::debug!("Executor metrics reset");
    }

    pub fn reset_circuit_breaker(&self) {
        self.shared.breaker.reset();
    }
}

impl Shared {
    async fn run_task<T, E>(
        &self,
        task: T,
        executor: &E,
        on_progress: Option<&dyn ProgressObserver<E::Output>>,
        completed: &AtomicUsize,
        total: usize,
    ) -> ExecutionResult<E::Output>
    where
        T: Task,
        E: TaskExecutor<T>,
    {
        if !self.breaker.can_execute() {
            tracing::debug!(task_id = task.id(), "Task rejected by open circuit breaker");
            return ExecutionResult::rejected(task.id(), CIRCUIT_OPEN_MESSAGE);
        }

        self.limiter.acquire().await;
        let _active = ActiveWorker::start(self);

        let started = Instant::now();
        let result = self.retry.run(&task, executor).await;
        let result = result.with_duration(started.elapsed());

        self.metrics.record(&result);
        if result.success {
            self.breaker.record_success();
        } else {
            self.breaker.record_failure();
        }

        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(observer) = on_progress {
            observer.on_progress(done, total, &result);
        }

        if self.config.metrics_enabled()
            && let Some(observer) = &self.metrics_observer
        {
            observer.on_metrics_update(&self.metrics_snapshot());
        }

        result
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics
            .snapshot(self.breaker.state(), self.limiter.snapshot())
    }
}

/// Active-worker slot. Dropping it releases the gauge and records the
/// completion in the rate-limit window, also when the worker panics.
struct ActiveWorker<'a> {
    shared: &'a Shared,
}

impl<'a> ActiveWorker<'a> {
    fn start(shared: &'a Shared) -> Self {
        shared.metrics.task_started();
        Self { shared }
    }
}

impl Drop for ActiveWorker<'_> {
    fn drop(&mut self) {
        self.shared.metrics.task_finished();
        self.shared.limiter.record_completion();
    }
}
