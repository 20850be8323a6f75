//! Executor configuration.
//!
//! Every section can be written in JSON; durations travel as milliseconds
//! (`retry_delay_ms`, `max_retry_delay_ms`, `reset_timeout_ms`). Missing
//! sections fall back to their defaults.
//!
//! ```json
//! {
//!   "concurrency": 4,
//!   "rate_limit": { "max_requests_per_minute": 60 },
//!   "retry": { "max_retries": 2, "retry_delay_ms": 500 },
//!   "circuit_breaker": { "enabled": true, "failure_threshold": 5 },
//!   "metrics": { "enabled": true }
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ExecutorError;
use crate::ports::MetricsObserver;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_millis(30_000);
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Immutable configuration of one `ParallelExecutor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Max tasks with an in-flight attempt at once (also the batch size).
    pub concurrency: usize,

    pub rate_limit: Option<RateLimitConfig>,

    pub retry: RetryConfig,

    pub circuit_breaker: Option<CircuitBreakerConfig>,

    pub metrics: Option<MetricsConfig>,

    /// Accepted and reported, but the dispatcher does not reorder by priority yet.
    pub enable_priority: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            rate_limit: None,
            retry: RetryConfig::default(),
            circuit_breaker: None,
            metrics: None,
            enable_priority: false,
        }
    }
}

impl ExecutorConfig {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            ..Self::default()
        }
    }

    pub fn with_rate_limit(mut self, max_requests_per_minute: u32) -> Self {
        self.rate_limit = Some(RateLimitConfig {
            max_requests_per_minute,
        });
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_circuit_breaker(mut self, failure_threshold: u32, reset_timeout: Duration) -> Self {
        self.circuit_breaker = Some(CircuitBreakerConfig {
            enabled: true,
            failure_threshold,
            reset_timeout,
        });
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fail-fast check run by `ParallelExecutor::new`.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if self.concurrency == 0 {
            return Err(ExecutorError::InvalidConcurrency(self.concurrency));
        }
        if let Some(rl) = &self.rate_limit
            && rl.max_requests_per_minute == 0
        {
            return Err(ExecutorError::InvalidRateLimit);
        }
        if let Some(cb) = &self.circuit_breaker
            && cb.enabled
            && cb.failure_threshold == 0
        {
            return Err(ExecutorError::InvalidFailureThreshold);
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, ExecutorError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExecutorError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub(crate) fn metrics_enabled(&self) -> bool {
        self.metrics.as_ref().is_some_and(|m| m.enabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests_per_minute: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,

    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,

    pub exponential_backoff: bool,

    /// Upper bound for a single backoff delay. `None` leaves delays unclamped.
    #[serde(rename = "max_retry_delay_ms", with = "duration_ms::option")]
    pub max_retry_delay: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            exponential_backoff: true,
            max_retry_delay: Some(DEFAULT_MAX_RETRY_DELAY),
        }
    }
}

impl RetryConfig {
    /// No retries at all: one attempt per task.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub failure_threshold: u32,

    #[serde(rename = "reset_timeout_ms", with = "duration_ms")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

/// Metrics section. The observer is attached in code and never serialized.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,

    #[serde(skip)]
    pub on_metrics_update: Option<Arc<dyn MetricsObserver>>,
}

impl MetricsConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            on_metrics_update: None,
        }
    }

    pub fn with_observer(mut self, observer: impl MetricsObserver + 'static) -> Self {
        self.on_metrics_update = Some(Arc::new(observer));
        self
    }
}

impl fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("enabled", &self.enabled)
            .field("on_metrics_update", &self.on_metrics_update.is_some())
            .finish()
    }
}

/// `Duration` <-> integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => super::serialize(d, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
            Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExecutorConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.retry_delay, Duration::from_millis(1000));
        assert!(config.retry.exponential_backoff);
        assert_eq!(config.retry.max_retry_delay, Some(Duration::from_millis(30_000)));
        assert!(config.circuit_breaker.is_none());
        assert!(config.rate_limit.is_none());
        assert!(!config.metrics_enabled());
    }

    #[test]
    fn parses_partial_json_with_defaults() {
        let config = ExecutorConfig::from_json_str(
            r#"{
                "concurrency": 4,
                "rate_limit": { "max_requests_per_minute": 60 },
                "retry": { "max_retries": 2, "retry_delay_ms": 500 },
                "circuit_breaker": { "enabled": true, "failure_threshold": 3 },
                "metrics": { "enabled": true }
            }"#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(config.rate_limit.unwrap().max_requests_per_minute, 60);
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.retry_delay, Duration::from_millis(500));
        assert!(config.retry.exponential_backoff);
        let cb = config.circuit_breaker.unwrap();
        assert!(cb.enabled);
        assert_eq!(cb.failure_threshold, 3);
        assert_eq!(cb.reset_timeout, DEFAULT_RESET_TIMEOUT);
        assert!(config.metrics_enabled());
    }

    #[test]
    fn null_max_retry_delay_disables_the_cap() {
        let config =
            ExecutorConfig::from_json_str(r#"{ "retry": { "max_retry_delay_ms": null } }"#).unwrap();
        assert_eq!(config.retry.max_retry_delay, None);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = ExecutorConfig::new(0).validate().unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConcurrency(0)));
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let err = ExecutorConfig::new(2).with_rate_limit(0).validate().unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidRateLimit));
    }

    #[test]
    fn enabled_breaker_needs_positive_threshold() {
        let err = ExecutorConfig::new(2)
            .with_circuit_breaker(0, Duration::from_secs(1))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidFailureThreshold));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ExecutorConfig::from_json_str("{ concurrency: }").unwrap_err();
        assert!(matches!(err, ExecutorError::ConfigParse(_)));
    }
}
