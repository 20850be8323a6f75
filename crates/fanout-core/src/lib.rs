//! fanout-core
//!
//! In-process parallel task execution: batches under a concurrency cap,
//! sliding-window rate limiting, exponential-backoff retry, and a shared
//! circuit breaker, with live metrics.
//!
//! # モジュール構成
//! - **domain**: Task trait, ExecutionResult, errors
//! - **ports**: TaskExecutor と各種 observer trait
//! - **resilience**: rate limiter, retry policy, circuit breaker
//! - **observability**: MetricsCollector / MetricsSnapshot
//! - **app**: ParallelExecutor, execute_in_waves, ExecutorStatus
//! - **config**: ExecutorConfig と JSON 読み込み

pub mod app;
pub mod config;
pub mod domain;
pub mod observability;
pub mod ports;
pub mod resilience;

pub use app::{ExecutorStatus, ParallelExecutor, SharedProgress, execute_in_waves};
pub use config::{
    CircuitBreakerConfig, ExecutorConfig, MetricsConfig, RateLimitConfig, RetryConfig,
};
pub use domain::{
    ExecutionResult, ExecutionSummary, ExecutorError, Task, TaskFailure, TaskSpec, TaskStatus,
};
pub use observability::MetricsSnapshot;
pub use ports::{MetricsObserver, ProgressObserver, TaskExecutor, WaveObserver};
pub use resilience::CircuitState;
