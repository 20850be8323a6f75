//! Circuit breaker shared by every task of one executor.
//!
//! # State Machine
//!
//! ```text
//! Closed   --[consecutive_failures >= threshold]--> Open
//! Open     --[admission check after reset_timeout]--> HalfOpen
//! HalfOpen --[success]--> Closed
//! HalfOpen --[consecutive_failures >= threshold]--> Open
//! ```
//!
//! Entering HalfOpen starts a fresh failure count. A failure while half-open
//! only increments that count, exactly as when closed, so the breaker
//! reopens once the threshold is reached again, not on the first half-open
//! failure.
//!
//! # Thread Safety
//!
//! Worker tasks of one batch report concurrently, so the state lives behind
//! a `parking_lot::Mutex` and every transition happens under the lock.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Normal operation.
    #[default]
    Closed,
    /// Failing fast, nothing is admitted.
    Open,
    /// Reset timeout elapsed, attempts are admitted to probe recovery.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSnapshot {
    pub enabled: bool,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub opened_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CircuitBreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    /// Monotonic open time used for the reset timeout.
    opened_at: Option<Instant>,
    /// Wall-clock open time, for status reporting only.
    opened_at_utc: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitBreakerInner>,
}

impl CircuitBreaker {
    /// `None` or `enabled: false` yields a breaker that always admits.
    pub fn new(config: Option<CircuitBreakerConfig>) -> Self {
        Self {
            config: config.unwrap_or_default(),
            inner: Mutex::new(CircuitBreakerInner::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Admission check. Moves Open to HalfOpen once the reset timeout elapsed.
    pub fn can_execute(&self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|at| at.elapsed());
                match elapsed {
                    Some(elapsed) if elapsed >= self.config.reset_timeout => {
                        inner.state = CircuitState::HalfOpen;
                        inner.consecutive_failures = 0;
                        tracing::info!(
                            open_for_ms = elapsed.as_millis() as u64,
                            "Circuit breaker half-open, probing recovery"
                        );
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    pub fn record_success(&self) {
        if !self.config.enabled {
            return;
        }

        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.opened_at = None;
            inner.opened_at_utc = None;
            tracing::info!("Circuit breaker CLOSED after successful probe");
        }
    }

    pub fn record_failure(&self) {
        if !self.config.enabled {
            return;
        }

        let mut inner = self.inner.lock();
        inner.consecutive_failures += 1;
        if inner.state != CircuitState::Open
            && inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.opened_at_utc = Some(Utc::now());
            tracing::warn!(
                consecutive_failures = inner.consecutive_failures,
                threshold = self.config.failure_threshold,
                reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                "Circuit breaker OPENED"
            );
        }
    }

    /// Force the breaker back to Closed with a clean counter.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let previous = inner.state;
        *inner = CircuitBreakerInner::default();
        tracing::info!(previous = %previous, "Circuit breaker manually reset");
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    pub fn snapshot(&self) -> CircuitBreakerSnapshot {
        let inner = self.inner.lock();
        CircuitBreakerSnapshot {
            enabled: self.config.enabled,
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            opened_at: inner.opened_at_utc,
        }
    }
}
