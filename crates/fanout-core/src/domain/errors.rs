//! Errors - エラー型と分類
//!
//! - `TaskFailure`: TaskExecutor が返す失敗（リトライ対象）
//! - `ExecutorError`: 構築時の設定エラー（実行時には発生しない）

use thiserror::Error;

/// TaskFailure はタスク 1 回の試行失敗
///
/// executor はこれを「リトライ可能な失敗」として扱う。最後の失敗の
/// メッセージだけが `ExecutionResult::error` に残る。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskFailure {
    message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// 任意のエラー型から Display を使って変換
    pub fn from_error<E: std::error::Error>(err: E) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for TaskFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TaskFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// ExecutorError は executor の構築・設定エラー
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("rate limit must allow at least 1 request per minute")]
    InvalidRateLimit,

    #[error("circuit breaker failure_threshold must be at least 1")]
    InvalidFailureThreshold,

    #[error("failed to parse executor config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("failed to read executor config: {0}")]
    ConfigIo(#[from] std::io::Error),
}
