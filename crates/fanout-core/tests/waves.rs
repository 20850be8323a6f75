use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fanout_core::domain::{CIRCUIT_OPEN_BATCH_MESSAGE, CIRCUIT_OPEN_MESSAGE};
use fanout_core::{
    CircuitState, ExecutionResult, ExecutionSummary, ExecutorConfig, ExecutorError,
    ParallelExecutor, RetryConfig, SharedProgress, Task, TaskExecutor, TaskFailure, WaveObserver,
};

/// A domain-specific task type: the executor only needs `id`.
#[derive(Debug, Clone)]
struct GeneratePlan {
    id: String,
    athlete: String,
    fails: bool,
}

impl GeneratePlan {
    fn new(id: &str, fails: bool) -> Self {
        Self {
            id: id.to_string(),
            athlete: format!("athlete-{id}"),
            fails,
        }
    }
}

impl Task for GeneratePlan {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Default)]
struct PlanGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TaskExecutor<GeneratePlan> for PlanGenerator {
    type Output = String;

    async fn execute(&self, task: &GeneratePlan) -> Result<String, TaskFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if task.fails {
            Err(TaskFailure::new("model unavailable"))
        } else {
            Ok(format!("plan for {}", task.athlete))
        }
    }
}

fn wave(prefix: &str, n: usize, fails: bool) -> Vec<GeneratePlan> {
    (0..n)
        .map(|i| GeneratePlan::new(&format!("{prefix}{i}"), fails))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn failed_middle_wave_does_not_stop_the_last_wave() {
    let waves = vec![wave("w0-", 3, false), wave("w1-", 2, true), wave("w2-", 3, false)];
    let exec = Arc::new(PlanGenerator::default());
    let seen_waves: Arc<support::EventLog> = Arc::default();

    let log = Arc::clone(&seen_waves);
    let on_wave = move |index: usize, results: &[ExecutionResult<String>]| {
        log.push(index, results.len(), results.iter().filter(|r| !r.success).count());
    };

    let config = ExecutorConfig::new(2).with_retry(RetryConfig::none());
    let on_wave: &dyn WaveObserver<String> = &on_wave;
    let results = fanout_core::execute_in_waves(waves, Arc::clone(&exec), config, Some(on_wave), None)
        .await
        .unwrap();

    assert_eq!(results.len(), 8);
    let summary = ExecutionSummary::from_results(&results);
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.failed, 2);
    assert!(results.iter().any(|r| r.task_id == "w2-2" && r.success));

    assert_eq!(seen_waves.entries(), vec![(0, 3, 0), (1, 2, 2), (2, 3, 0)]);
    assert_eq!(exec.calls.load(Ordering::SeqCst), 8);
}

#[tokio::test(start_paused = true)]
async fn waves_preserve_dependency_order() {
    let waves = vec![wave("a", 2, false), wave("b", 2, false)];
    let results = fanout_core::execute_in_waves(
        waves,
        Arc::new(PlanGenerator::default()),
        ExecutorConfig::new(4),
        None,
        None,
    )
    .await
    .unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.task_id.as_str()).collect();
    assert!(ids[..2].iter().all(|id| id.starts_with('a')));
    assert!(ids[2..].iter().all(|id| id.starts_with('b')));
}

#[tokio::test(start_paused = true)]
async fn breaker_state_carries_across_waves() {
    let parallel = ParallelExecutor::new(
        ExecutorConfig::new(1)
            .with_retry(RetryConfig::none())
            .with_circuit_breaker(2, Duration::from_secs(60)),
    )
    .unwrap();
    let exec = Arc::new(PlanGenerator::default());
    let waves = vec![wave("bad", 3, true), wave("good", 2, false)];

    let results = parallel.execute_waves(waves, Arc::clone(&exec), None, None).await;

    assert_eq!(results.len(), 5);
    assert_eq!(results[2].error.as_deref(), Some(CIRCUIT_OPEN_MESSAGE));
    assert!(results[3..]
        .iter()
        .all(|r| r.error.as_deref() == Some(CIRCUIT_OPEN_BATCH_MESSAGE)));
    assert_eq!(exec.calls.load(Ordering::SeqCst), 2);
    assert_eq!(parallel.status().circuit_breaker.state, CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn progress_counts_restart_per_wave() {
    let totals: Arc<support::EventLog> = Arc::default();
    let log = Arc::clone(&totals);
    let progress: SharedProgress<String> =
        Arc::new(move |done: usize, total: usize, _r: &ExecutionResult<String>| {
            log.push(done, total, 0);
        });

    fanout_core::execute_in_waves(
        vec![wave("x", 2, false), wave("y", 1, false)],
        Arc::new(PlanGenerator::default()),
        ExecutorConfig::new(2),
        None,
        Some(progress),
    )
    .await
    .unwrap();

    let entries: Vec<(usize, usize)> = totals.entries().iter().map(|e| (e.0, e.1)).collect();
    assert_eq!(entries, vec![(1, 2), (2, 2), (1, 1)]);
}

#[tokio::test]
async fn invalid_config_is_the_only_error() {
    let err = fanout_core::execute_in_waves(
        vec![wave("z", 1, false)],
        Arc::new(PlanGenerator::default()),
        ExecutorConfig::new(0),
        None,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidConcurrency(0)));
}

/// Minimal thread-safe log for observer callbacks.
mod support {
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct EventLog(Mutex<Vec<(usize, usize, usize)>>);

    impl EventLog {
        pub fn push(&self, a: usize, b: usize, c: usize) {
            self.0.lock().unwrap().push((a, b, c));
        }

        pub fn entries(&self) -> Vec<(usize, usize, usize)> {
            self.0.lock().unwrap().clone()
        }
    }
}
