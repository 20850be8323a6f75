//! Sliding-window rate limiter.
//!
//! Admission is measured against the task *completions* recorded in the
//! trailing 60 seconds, not against starts. Under long-running tasks this
//! under-counts in-flight work; callers rely on that throughput profile, so
//! it is kept as is.
//!
//! # Algorithm
//!
//! ```text
//! acquire():
//!   drop timestamps older than now - 60s
//!   if remaining >= max:
//!     sleep(oldest + 60s - now + 100ms)     // single wait, no re-check
//!
//! record_completion():
//!   push now
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Length of the trailing window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Added to every computed wait so the oldest entry has surely left the window.
pub const RATE_LIMIT_SAFETY_MARGIN: Duration = Duration::from_millis(100);

/// Rate limit section of a metrics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    /// Completions currently held in the window.
    pub current: usize,
    /// Configured cap (0 when rate limiting is off).
    pub max: u32,
    pub utilization_percent: f64,
}

/// Admission control over completions in the trailing [`RATE_LIMIT_WINDOW`].
///
/// Without a configured cap `acquire` never waits, but completions are still
/// recorded so the snapshot reports recent throughput.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    max_per_window: Option<u32>,
    completions: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: Option<RateLimitConfig>) -> Self {
        Self {
            max_per_window: config.map(|c| c.max_requests_per_minute),
            completions: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_per_window.is_some()
    }

    /// Wait until a new attempt may start. Returns how long the caller was held.
    pub async fn acquire(&self) -> Duration {
        let Some(max) = self.max_per_window else {
            return Duration::ZERO;
        };

        let wait = {
            let mut completions = self.completions.lock();
            let now = Instant::now();
            prune(&mut completions, now);

            match completions.front() {
                Some(&oldest) if completions.len() >= max as usize => {
                    (oldest + RATE_LIMIT_WINDOW + RATE_LIMIT_SAFETY_MARGIN)
                        .saturating_duration_since(now)
                }
                _ => Duration::ZERO,
            }
        };

        if !wait.is_zero() {
            tracing::info!(
                wait_ms = wait.as_millis() as u64,
                max_per_minute = max,
                "Rate limit reached, delaying task start"
            );
            tokio::time::sleep(wait).await;
        }
        wait
    }

    /// Record that a task finished (success or failure).
    pub fn record_completion(&self) {
        let mut completions = self.completions.lock();
        let now = Instant::now();
        prune(&mut completions, now);
        completions.push_back(now);
    }

    /// Completions held in the window as of the last acquire/record.
    pub fn current(&self) -> usize {
        self.completions.lock().len()
    }

    pub fn max(&self) -> u32 {
        self.max_per_window.unwrap_or(0)
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let current = self.current();
        let max = self.max();
        let utilization_percent = if max == 0 {
            0.0
        } else {
            current as f64 / f64::from(max) * 100.0
        };
        RateLimitSnapshot {
            current,
            max,
            utilization_percent,
        }
    }
}

fn prune(completions: &mut VecDeque<Instant>, now: Instant) {
    let before = completions.len();
    while let Some(&oldest) = completions.front() {
        if now.saturating_duration_since(oldest) <= RATE_LIMIT_WINDOW {
            break;
        }
        completions.pop_front();
    }
    let dropped = before - completions.len();
    if dropped > 0 {
        tracing::trace!(dropped, remaining = completions.len(), "Pruned rate limit window");
    }
}
