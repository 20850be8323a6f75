//! Resilience - executor を下流の障害から守る部品
//!
//! - **SlidingWindowRateLimiter**: 直近 60 秒の完了数による流量制御
//! - **RetryPolicy**: 指数バックオフ付きの再試行
//! - **CircuitBreaker**: 連続失敗で fail-fast する 3 状態のガード

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;

pub use self::circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot, CircuitState};
pub use self::rate_limiter::{RateLimitSnapshot, SlidingWindowRateLimiter};
pub use self::retry::RetryPolicy;
