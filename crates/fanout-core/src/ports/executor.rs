//! TaskExecutor port - 呼び出し側が提供する「1 タスクを実行する能力」
//!
//! # 学習ポイント
//! - async_trait による非同期 trait
//! - Associated type (`Output`) で結果の型を executor ごとに決める

use async_trait::async_trait;

use crate::domain::{Task, TaskFailure};

/// TaskExecutor は 1 タスクを 1 回試行する
///
/// # 使用例
/// ```ignore
/// struct MealPlanExecutor {
///     client: AiClient,
/// }
///
/// #[async_trait]
/// impl TaskExecutor<TaskSpec> for MealPlanExecutor {
///     type Output = serde_json::Value;
///
///     async fn execute(&self, task: &TaskSpec) -> Result<serde_json::Value, TaskFailure> {
///         self.client.generate(&task.payload).await.map_err(TaskFailure::from_error)
///     }
/// }
/// ```
///
/// # 失敗の扱い
/// - `Err(TaskFailure)` はリトライ可能な失敗として RetryPolicy に渡る
/// - キャンセルやタイムアウトが必要なら実装側で組み込む（executor は中断しない）
#[async_trait]
pub trait TaskExecutor<T: Task>: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn execute(&self, task: &T) -> Result<Self::Output, TaskFailure>;
}
