//! Domain model (tasks, results, errors).
//!
//! - task: `Task` trait と汎用 `TaskSpec`
//! - result: `ExecutionResult` と集計用 `ExecutionSummary`
//! - state: advisory な `TaskStatus`
//! - errors: `TaskFailure`（リトライ対象）と `ExecutorError`（設定エラー）

pub mod errors;
pub mod result;
pub mod state;
pub mod task;

pub use errors::{ExecutorError, TaskFailure};
pub use result::{
    CIRCUIT_OPEN_BATCH_MESSAGE, CIRCUIT_OPEN_MESSAGE, ExecutionResult, ExecutionSummary,
    UNKNOWN_TASK_ID,
};
pub use state::TaskStatus;
pub use task::{Task, TaskSpec};
