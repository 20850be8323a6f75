//! Status - executor の現在の状態
//!
//! `ParallelExecutor::status()` が返す。詰まり（breaker open / rate limit）の
//! 理由を説明するためのビュー。

use serde::{Deserialize, Serialize};

use crate::resilience::{CircuitBreakerSnapshot, CircuitState, RateLimitSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorStatus {
    pub concurrency: usize,
    pub active_workers: usize,
    pub priority_enabled: bool,
    pub circuit_breaker: CircuitBreakerSnapshot,
    pub rate_limit: RateLimitSnapshot,
}

impl ExecutorStatus {
    /// New work is being refused right now.
    pub fn is_failing_fast(&self) -> bool {
        self.circuit_breaker.state == CircuitState::Open
    }

    pub fn is_idle(&self) -> bool {
        self.active_workers == 0
    }
}
